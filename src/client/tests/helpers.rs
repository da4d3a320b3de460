//! Shared test helpers for client tests.

use std::{
    future::{self, Future},
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::{
    client::{LitClient, LitClientBuilder},
    endpoint::Endpoint,
    transport::{
        ChannelConnector,
        ChannelPeer,
        Connector,
        Fragment,
        FragmentSource,
        MessageSink,
        TransportError,
        channel_pair,
    },
};

/// Type alias for the counting hooks used by lifecycle tests.
pub type CountingHookClosure = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Build and connect a client over the in-memory transport.
pub async fn connected_client<F>(configure_builder: F) -> (LitClient<ChannelConnector>, ChannelPeer)
where
    F: FnOnce(LitClientBuilder<ChannelConnector>) -> LitClientBuilder<ChannelConnector>,
{
    let (connector, peer) = channel_pair();
    let client = configure_builder(LitClientBuilder::new().connector(connector))
        .connect()
        .await
        .expect("connect client");
    (client, peer)
}

/// Build a client over the in-memory transport without connecting it.
pub fn idle_client() -> (LitClient<ChannelConnector>, ChannelPeer) {
    let (connector, peer) = channel_pair();
    (LitClientBuilder::new().connector(connector).build(), peer)
}

/// Creates a counter and a hook that increments it each time it runs.
pub fn counting_hook() -> (Arc<AtomicUsize>, CountingHookClosure) {
    let counter = Arc::new(AtomicUsize::new(0));
    let count = counter.clone();

    let increment = move || {
        let count = count.clone();
        Box::pin(async move {
            count.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    };

    (counter, Arc::new(increment))
}

/// Wait for the next request the client sends and parse it as JSON.
pub async fn next_request(peer: &mut ChannelPeer) -> Value {
    let bytes = peer.recv_message().await.expect("client sent a request");
    serde_json::from_slice(&bytes).expect("request is JSON")
}

/// Id of a parsed request envelope.
pub fn request_id(request: &Value) -> u64 { request["id"].as_u64().expect("request has an id") }

/// Reply to request `id` with `result`.
pub fn reply(peer: &ChannelPeer, id: u64, result: &Value) {
    let message = serde_json::json!({ "id": id, "result": result, "error": "" });
    peer.send_message(message.to_string()).expect("client listening");
}

/// Connector whose sink rejects every message and whose source never yields.
pub struct BrokenPipeConnector;

pub struct BrokenPipeSink;

pub struct SilentSource;

#[async_trait]
impl Connector for BrokenPipeConnector {
    type Sink = BrokenPipeSink;
    type Source = SilentSource;

    async fn connect(&self, _endpoint: &Endpoint) -> Result<(Self::Sink, Self::Source), TransportError> {
        Ok((BrokenPipeSink, SilentSource))
    }
}

#[async_trait]
impl MessageSink for BrokenPipeSink {
    async fn send_message(&mut self, _message: Bytes) -> Result<(), TransportError> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe").into())
    }

    async fn close(&mut self) -> Result<(), TransportError> { Err(TransportError::Closed) }
}

#[async_trait]
impl FragmentSource for SilentSource {
    async fn next_fragment(&mut self) -> Option<Result<Fragment, TransportError>> {
        future::pending().await
    }
}
