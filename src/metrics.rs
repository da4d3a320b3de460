//! Metric helpers for `litrpc`.
//!
//! This module defines metric names and thin wrappers around the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

/// Name of the counter tracking completed calls, labelled by outcome.
pub const CALLS_TOTAL: &str = "litrpc_calls_total";
/// Name of the counter tracking replies that matched no pending call.
pub const REPLIES_DROPPED: &str = "litrpc_replies_dropped_total";
/// Name of the counter tracking malformed inbound messages.
pub const PROTOCOL_ERRORS: &str = "litrpc_protocol_errors_total";
/// Name of the gauge tracking calls awaiting a reply.
pub const PENDING_REQUESTS: &str = "litrpc_pending_requests";

/// How a call finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    /// The reply decoded successfully.
    Ok,
    /// The node returned an error string.
    Remote,
    /// Any other failure: transport, decode or teardown.
    Failed,
}

impl CallOutcome {
    fn as_str(self) -> &'static str {
        match self {
            CallOutcome::Ok => "ok",
            CallOutcome::Remote => "remote_error",
            CallOutcome::Failed => "failed",
        }
    }
}

/// Record a finished call.
pub fn inc_calls(outcome: CallOutcome) {
    #[cfg(feature = "metrics")]
    metrics::counter!(CALLS_TOTAL, "outcome" => outcome.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = outcome.as_str();
}

/// Record a reply that matched no pending call.
pub fn inc_dropped_replies() {
    #[cfg(feature = "metrics")]
    metrics::counter!(REPLIES_DROPPED).increment(1);
}

/// Record a malformed inbound message.
pub fn inc_protocol_errors() {
    #[cfg(feature = "metrics")]
    metrics::counter!(PROTOCOL_ERRORS).increment(1);
}

/// Publish the current size of the pending-call table.
#[expect(
    clippy::cast_precision_loss,
    reason = "pending counts stay far below f64 precision limits"
)]
pub fn set_pending(count: usize) {
    #[cfg(feature = "metrics")]
    metrics::gauge!(PENDING_REQUESTS).set(count as f64);
    #[cfg(not(feature = "metrics"))]
    let _ = count as f64;
}
