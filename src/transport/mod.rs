//! Transport primitives used by the client runtime.
//!
//! A transport is split into two halves once connected: a [`MessageSink`]
//! that writes one complete message at a time, and a [`FragmentSource`] that
//! yields inbound data as [`Fragment`]s. A fragment may carry only part of a
//! message; the final fragment of each message is flagged so the receive loop
//! can reassemble it.
//!
//! [`WebSocketConnector`] speaks to a real node. [`ChannelConnector`] wires the
//! client to an in-memory peer and is what the test suite drives.

mod channel;
mod websocket;

use async_trait::async_trait;
use bytes::Bytes;

pub use channel::{ChannelConnector, ChannelPeer, ChannelSink, ChannelSource, channel_pair};
pub use websocket::{WebSocketConnector, WebSocketSink, WebSocketSource};

use crate::endpoint::Endpoint;

/// One transport-level delivery unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    payload: Bytes,
    is_final: bool,
}

impl Fragment {
    /// Construct a fragment from raw bytes.
    #[must_use]
    pub fn new(payload: impl Into<Bytes>, is_final: bool) -> Self {
        Self {
            payload: payload.into(),
            is_final,
        }
    }

    /// Construct a fragment that carries a whole message.
    #[must_use]
    pub fn complete(payload: impl Into<Bytes>) -> Self { Self::new(payload, true) }

    /// Borrow the fragment payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Whether this fragment ends its message.
    #[must_use]
    pub const fn is_final(&self) -> bool { self.is_final }
}

/// Errors raised by transport implementations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The WebSocket layer failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    /// The connection request could not be built from the endpoint.
    #[error("invalid connection request: {0}")]
    InvalidRequest(String),
    /// The peer is gone.
    #[error("transport closed")]
    Closed,
    /// An I/O error outside the WebSocket layer.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write half of a connected transport.
#[async_trait]
pub trait MessageSink: Send + 'static {
    /// Send one complete message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the message could not be written.
    async fn send_message(&mut self, message: Bytes) -> Result<(), TransportError>;

    /// Ask the peer to close the connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the close handshake could not be sent.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Read half of a connected transport.
#[async_trait]
pub trait FragmentSource: Send + 'static {
    /// Receive the next fragment.
    ///
    /// Returns `None` once the stream has ended.
    async fn next_fragment(&mut self) -> Option<Result<Fragment, TransportError>>;
}

/// Factory that opens a transport to an [`Endpoint`].
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Write half produced by this connector.
    type Sink: MessageSink;
    /// Read half produced by this connector.
    type Source: FragmentSource;

    /// Open the transport and split it into its two halves.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the connection cannot be established.
    async fn connect(&self, endpoint: &Endpoint) -> Result<(Self::Sink, Self::Source), TransportError>;
}
