#![doc(html_root_url = "https://docs.rs/litrpc/latest")]
//! Client library for the JSON RPC socket of a LIT node.
//!
//! The crate issues calls over one long-lived connection and matches the
//! node's replies, which may arrive in any order, back to the calls that
//! are waiting for them. Method-specific wrappers are expected to sit on
//! top of [`LitClient::invoke`]; this crate only moves envelopes.

pub mod client;
pub mod correlation;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod transport;

pub use client::{ConnectionState, LitClient, LitClientBuilder, TracingConfig};
pub use correlation::{PendingRequest, ReplyFuture, RequestCorrelator};
pub use endpoint::Endpoint;
pub use envelope::{IncomingEnvelope, OutgoingEnvelope, ReplyOutcome, decode_reply, encode_request};
pub use error::{BoxError, ClientError, ProtocolError};
pub use frame::FrameAssembler;
pub use metrics::{CALLS_TOTAL, PENDING_REQUESTS, PROTOCOL_ERRORS, REPLIES_DROPPED};
pub use transport::{Fragment, TransportError};
