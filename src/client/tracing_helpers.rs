//! Tracing span and event helpers for LIT client operations.
//!
//! These helpers centralise span creation with dynamic level selection and
//! per-operation timing, keeping the instrumentation out of the call paths.

use std::time::Instant;

use tracing::{Level, Span};

use super::tracing_config::TracingConfig;

/// Create a tracing span at a dynamically selected level.
///
/// Each branch calls the matching `tracing::<level>_span!` macro so the span
/// metadata is static per branch while the branch is chosen at runtime.
macro_rules! dynamic_span {
    ($level:expr, $name:expr $(, $($field:tt)*)?) => {
        match $level {
            Level::ERROR => tracing::error_span!($name $(, $($field)*)?),
            Level::WARN  => tracing::warn_span!($name $(, $($field)*)?),
            Level::INFO  => tracing::info_span!($name $(, $($field)*)?),
            Level::DEBUG => tracing::debug_span!($name $(, $($field)*)?),
            Level::TRACE => tracing::trace_span!($name $(, $($field)*)?),
        }
    };
}

/// Create a span for the `connect` operation.
#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn connect_span(config: &TracingConfig, endpoint: &str) -> Span {
    dynamic_span!(
        config.connect_level,
        "client.connect",
        endpoint = endpoint,
        result = tracing::field::Empty
    )
}

/// Create a span for one `invoke` round trip.
///
/// `rpc.id` is recorded once the id is allocated and `result` when the call
/// completes.
#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn invoke_span(config: &TracingConfig, method: &str) -> Span {
    dynamic_span!(
        config.invoke_level,
        "client.invoke",
        rpc.method = method,
        rpc.id = tracing::field::Empty,
        result = tracing::field::Empty
    )
}

/// Create a span for the `disconnect` operation.
#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn disconnect_span(config: &TracingConfig) -> Span {
    dynamic_span!(
        config.disconnect_level,
        "client.disconnect",
        drained = tracing::field::Empty
    )
}

/// Start a timer if timing is enabled for the operation.
pub(crate) fn start_timer(enabled: bool) -> Option<Instant> { enabled.then(Instant::now) }

/// Record elapsed time if timing was enabled for this operation.
///
/// Emits a `DEBUG` event with the `elapsed_us` field inside `span`.
pub(crate) fn emit_timing_event(span: &Span, start: Option<Instant>) {
    if let Some(start) = start {
        let elapsed_us = start.elapsed().as_micros();
        span.in_scope(|| tracing::debug!(elapsed_us = elapsed_us, "operation.timing"));
    }
}

/// Label used for the `result` span field.
pub(crate) fn result_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "ok" } else { "err" }
}
