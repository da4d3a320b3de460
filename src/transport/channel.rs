//! In-memory transport connecting a client to a [`ChannelPeer`].

use std::{io, sync::Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::{Connector, Fragment, FragmentSource, MessageSink, TransportError};
use crate::endpoint::Endpoint;

type Halves = (UnboundedSender<Bytes>, UnboundedReceiver<Fragment>);

/// Create a connector and the peer that sits on the other end of it.
///
/// The connector can be used for a single connection. Messages the client
/// sends arrive at [`ChannelPeer::recv_message`]; fragments pushed by the peer
/// are delivered to the client's receive loop in order.
///
/// # Examples
///
/// ```
/// use litrpc::transport::{Fragment, channel_pair};
///
/// let (connector, peer) = channel_pair();
/// peer.send_fragment(Fragment::complete(&b"{}"[..])).expect("peer open");
/// # let _ = connector;
/// ```
#[must_use]
pub fn channel_pair() -> (ChannelConnector, ChannelPeer) {
    let (out_tx, out_rx) = unbounded_channel();
    let (in_tx, in_rx) = unbounded_channel();
    let connector = ChannelConnector {
        halves: Mutex::new(Some((out_tx, in_rx))),
        refuse: false,
    };
    let peer = ChannelPeer {
        outgoing: out_rx,
        incoming: Some(in_tx),
    };
    (connector, peer)
}

/// Connector for the in-memory transport.
#[derive(Debug)]
pub struct ChannelConnector {
    halves: Mutex<Option<Halves>>,
    refuse: bool,
}

impl ChannelConnector {
    /// A connector whose every connection attempt is refused.
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            halves: Mutex::new(None),
            refuse: true,
        }
    }
}

#[async_trait]
impl Connector for ChannelConnector {
    type Sink = ChannelSink;
    type Source = ChannelSource;

    async fn connect(&self, _endpoint: &Endpoint) -> Result<(Self::Sink, Self::Source), TransportError> {
        if self.refuse {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused").into());
        }
        let halves = self
            .halves
            .lock()
            .map_err(|_| TransportError::Closed)?
            .take();
        let (tx, rx) = halves.ok_or(TransportError::Closed)?;
        Ok((ChannelSink { tx: Some(tx) }, ChannelSource { rx }))
    }
}

/// Write half of the in-memory transport.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Option<UnboundedSender<Bytes>>,
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send_message(&mut self, message: Bytes) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(message).map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        Ok(())
    }
}

/// Read half of the in-memory transport.
#[derive(Debug)]
pub struct ChannelSource {
    rx: UnboundedReceiver<Fragment>,
}

#[async_trait]
impl FragmentSource for ChannelSource {
    async fn next_fragment(&mut self) -> Option<Result<Fragment, TransportError>> {
        self.rx.recv().await.map(Ok)
    }
}

/// Remote end of the in-memory transport.
#[derive(Debug)]
pub struct ChannelPeer {
    outgoing: UnboundedReceiver<Bytes>,
    incoming: Option<UnboundedSender<Fragment>>,
}

impl ChannelPeer {
    /// Wait for the next complete message sent by the client.
    ///
    /// Returns `None` once the client has closed its write half.
    pub async fn recv_message(&mut self) -> Option<Bytes> { self.outgoing.recv().await }

    /// Deliver one fragment to the client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the peer or the client's receive
    /// half has gone away.
    pub fn send_fragment(&self, fragment: Fragment) -> Result<(), TransportError> {
        let tx = self.incoming.as_ref().ok_or(TransportError::Closed)?;
        tx.send(fragment).map_err(|_| TransportError::Closed)
    }

    /// Deliver a whole message as a single final fragment.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the client is gone.
    pub fn send_message(&self, message: impl Into<Bytes>) -> Result<(), TransportError> {
        self.send_fragment(Fragment::complete(message))
    }

    /// End the inbound stream, as if the node dropped the connection.
    pub fn close(&mut self) { self.incoming = None; }

    /// Whether the client's receive half is still listening.
    #[must_use]
    pub fn is_client_listening(&self) -> bool {
        self.incoming.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}
