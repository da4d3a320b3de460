//! Client connection lifecycle hooks.
//!
//! Hooks fire at connection boundaries (setup, teardown) and whenever the
//! client observes an error, including malformed messages the receive loop
//! discards.

use std::{future::Future, pin::Pin, sync::Arc};

use super::ClientError;

/// A boxed future that is `Send` with a specified lifetime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handler invoked once the transport is open, before the receive loop
/// starts.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use litrpc::client::ClientConnectionSetupHandler;
///
/// let setup: ClientConnectionSetupHandler = Arc::new(|| Box::pin(async {}));
/// ```
pub type ClientConnectionSetupHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Handler invoked once when an open connection is torn down.
pub type ClientConnectionTeardownHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Handler invoked when the client encounters an error.
///
/// Called before a failed operation returns its error, and for every
/// inbound message the receive loop has to discard.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use litrpc::client::ClientErrorHandler;
///
/// let error_handler: ClientErrorHandler = Arc::new(|err| {
///     Box::pin(async move {
///         eprintln!("client error: {err}");
///     })
/// });
/// ```
pub type ClientErrorHandler =
    Arc<dyn for<'a> Fn(&'a ClientError) -> BoxFuture<'a, ()> + Send + Sync>;

/// Lifecycle callbacks configured through the builder.
#[expect(
    clippy::struct_field_names,
    reason = "on_ prefix is idiomatic for callback fields"
)]
#[derive(Clone, Default)]
pub(crate) struct LifecycleHooks {
    pub(crate) on_connect: Option<ClientConnectionSetupHandler>,
    pub(crate) on_disconnect: Option<ClientConnectionTeardownHandler>,
    pub(crate) on_error: Option<ClientErrorHandler>,
}

impl LifecycleHooks {
    pub(crate) async fn connected(&self) {
        if let Some(ref handler) = self.on_connect {
            handler().await;
        }
    }

    pub(crate) async fn disconnected(&self) {
        if let Some(ref handler) = self.on_disconnect {
            handler().await;
        }
    }

    pub(crate) async fn error(&self, error: &ClientError) {
        if let Some(ref handler) = self.on_error {
            handler(error).await;
        }
    }
}
