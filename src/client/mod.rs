//! Client runtime for a LIT node's RPC socket.
//!
//! [`LitClient`] owns one connection, a background receive loop and the
//! table of calls awaiting replies. Configure it through
//! [`LitClientBuilder`]; lifecycle hooks and [`TracingConfig`] let callers
//! observe the connection without wrapping every call.

mod builder;
mod hooks;
mod receive_loop;
mod runtime;
mod state;
mod tracing_config;
mod tracing_helpers;

pub use builder::{LitClientBuilder, MAX_MESSAGE_SIZE, MIN_MESSAGE_SIZE};
pub use hooks::{
    BoxFuture,
    ClientConnectionSetupHandler,
    ClientConnectionTeardownHandler,
    ClientErrorHandler,
};
pub use runtime::LitClient;
pub use state::ConnectionState;
pub use tracing_config::TracingConfig;

pub use crate::error::ClientError;

#[cfg(test)]
mod tests;
