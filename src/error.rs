//! Error types surfaced by the LIT RPC client.
//!
//! [`ClientError`] is what callers of [`LitClient`](crate::LitClient) see.
//! [`ProtocolError`] describes a single malformed inbound message; the receive
//! loop absorbs it and only reports it through the `on_error` hook.

use crate::transport::TransportError;

/// Boxed error returned by caller-supplied reply decoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors emitted by [`LitClient`](crate::LitClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport failed to connect, send or receive.
    #[error("connection error: {0}")]
    Connection(#[from] TransportError),
    /// The connection closed before a reply arrived, or the client is closed.
    #[error("connection closed")]
    ConnectionClosed,
    /// A call was issued before [`connect`](crate::LitClient::connect).
    #[error("client is not connected")]
    NotConnected,
    /// `connect` was called on a client that is already connecting or open.
    #[error("client is already connected")]
    AlreadyConnected,
    /// An inbound message was not a well-formed reply envelope.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// The node answered the call with a non-empty `error` field.
    #[error("{0}")]
    Remote(String),
    /// The reply `result` did not match the shape the caller expected.
    #[error("failed to decode reply: {0}")]
    Decode(#[source] BoxError),
    /// The request object could not be serialised to JSON.
    #[error("failed to serialize request: {0}")]
    Serialize(#[source] serde_json::Error),
    /// A request id was registered twice.
    #[error("request id {0} is already pending")]
    DuplicateId(u64),
}

impl ClientError {
    /// Returns the remote error text when the node rejected the call.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Remote(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Returns true when the error ended the connection rather than one call.
    #[must_use]
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::ConnectionClosed)
    }
}

/// Errors describing a malformed inbound message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The reassembled message was not valid UTF-8.
    #[error("message is not valid UTF-8")]
    InvalidUtf8,
    /// The message was not a JSON reply envelope.
    #[error("malformed reply envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
    /// The envelope carried no `id` field.
    #[error("reply envelope has no id")]
    MissingId,
    /// The reassembled message exceeded the configured size limit.
    #[error("message exceeds {limit} bytes")]
    MessageTooLarge {
        /// Maximum accepted message size in bytes.
        limit: usize,
    },
}
