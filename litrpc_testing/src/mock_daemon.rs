//! In-memory stand-in for a LIT node.

use bytes::Bytes;
use litrpc::{
    LitClient,
    LitClientBuilder,
    transport::{ChannelConnector, ChannelPeer, Fragment, channel_pair},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A request envelope as the node receives it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Request {
    /// Id the reply must carry.
    pub id: u64,
    /// Method name, e.g. `LitRPC.Balance`.
    pub method: String,
    /// Positional parameters; the client always sends exactly one.
    pub params: Vec<Value>,
}

impl Request {
    /// The single request object, or `Value::Null` if none was sent.
    #[must_use]
    pub fn param(&self) -> &Value { self.params.first().unwrap_or(&Value::Null) }
}

/// Node side of a channel transport.
///
/// All reply helpers panic if the client has stopped listening, which is
/// what a test wants when it expected the connection to be up.
#[derive(Debug)]
pub struct MockDaemon {
    peer: ChannelPeer,
}

/// Create a connector for a client and the daemon that answers it.
#[must_use]
pub fn mock_daemon() -> (ChannelConnector, MockDaemon) {
    let (connector, peer) = channel_pair();
    (connector, MockDaemon { peer })
}

/// Build a client with default settings and connect it to a fresh daemon.
///
/// # Panics
///
/// Panics if the in-memory connection cannot be opened.
pub async fn connected_client() -> (LitClient<ChannelConnector>, MockDaemon) {
    let (connector, daemon) = mock_daemon();
    let client = LitClientBuilder::new()
        .connector(connector)
        .connect()
        .await
        .expect("connect to mock daemon");
    (client, daemon)
}

impl MockDaemon {
    /// Wait for the next request from the client.
    ///
    /// Returns `None` once the client has closed its write half.
    ///
    /// # Panics
    ///
    /// Panics if the client sent something other than a request envelope.
    pub async fn next_request(&mut self) -> Option<Request> {
        let bytes = self.peer.recv_message().await?;
        Some(serde_json::from_slice(&bytes).expect("client sent a request envelope"))
    }

    /// Wait for `count` requests, in the order they were sent.
    ///
    /// # Panics
    ///
    /// Panics if the client closes before sending them all.
    pub async fn next_requests(&mut self, count: usize) -> Vec<Request> {
        let mut requests = Vec::with_capacity(count);
        for _ in 0..count {
            requests.push(self.next_request().await.expect("client still sending"));
        }
        requests
    }

    /// Answer request `id` successfully with `result`.
    ///
    /// # Panics
    ///
    /// Panics if `result` cannot be serialised or the client has gone.
    pub fn reply<T: Serialize + ?Sized>(&self, id: u64, result: &T) {
        self.send_json(&json!({ "id": id, "result": result, "error": "" }));
    }

    /// Answer request `id` with an error string.
    ///
    /// # Panics
    ///
    /// Panics if the client has gone.
    pub fn reply_error(&self, id: u64, message: &str) {
        self.send_json(&json!({ "id": id, "result": null, "error": message }));
    }

    /// Answer request `id` with `result`, split into fragments of at most
    /// `chunk` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk` is zero or the client has gone.
    pub fn reply_fragmented<T: Serialize + ?Sized>(&self, id: u64, result: &T, chunk: usize) {
        let message = json!({ "id": id, "result": result, "error": "" }).to_string();
        self.send_fragmented(message.as_bytes(), chunk);
    }

    /// Deliver `message` split into fragments of at most `chunk` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk` is zero or the client has gone.
    pub fn send_fragmented(&self, message: &[u8], chunk: usize) {
        let pieces: Vec<&[u8]> = message.chunks(chunk).collect();
        let last = pieces.len().saturating_sub(1);
        if pieces.is_empty() {
            self.send_raw(Bytes::new());
            return;
        }
        for (index, piece) in pieces.into_iter().enumerate() {
            self.peer
                .send_fragment(Fragment::new(piece.to_vec(), index == last))
                .expect("client listening");
        }
    }

    /// Deliver arbitrary bytes as one complete message.
    ///
    /// # Panics
    ///
    /// Panics if the client has gone.
    pub fn send_raw(&self, message: impl Into<Bytes>) {
        self.peer.send_message(message).expect("client listening");
    }

    /// Drop the connection from the node's side.
    pub fn hang_up(&mut self) { self.peer.close(); }

    /// Whether the client is still reading replies.
    #[must_use]
    pub fn is_client_listening(&self) -> bool { self.peer.is_client_listening() }

    fn send_json(&self, message: &Value) { self.send_raw(message.to_string()); }
}
