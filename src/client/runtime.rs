//! LIT client runtime implementation.

use std::{fmt, sync::Arc};

use bytes::Bytes;
use log::{info, warn};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use super::{
    ConnectionState,
    LitClientBuilder,
    TracingConfig,
    hooks::LifecycleHooks,
    receive_loop::{self, ReceiveLoopHandle},
    state::SharedConnection,
    tracing_helpers::{
        connect_span,
        disconnect_span,
        emit_timing_event,
        invoke_span,
        result_label,
        start_timer,
    },
};
use crate::{
    correlation::{PendingRequest, RequestCorrelator},
    endpoint::Endpoint,
    envelope::encode_request,
    error::{BoxError, ClientError},
    metrics::{self, CallOutcome},
    transport::{Connector, MessageSink, WebSocketConnector},
};

/// Client for a LIT node's JSON RPC socket.
///
/// One client owns one connection. Any number of tasks may issue calls
/// through a shared reference; replies are matched to their calls by id and
/// may arrive in any order. Once the connection ends, whether through
/// [`disconnect`](Self::disconnect) or because the node went away, every
/// outstanding call fails with [`ClientError::ConnectionClosed`] and the
/// client cannot be reconnected.
///
/// # Examples
///
/// ```no_run
/// use litrpc::{ClientError, LitClient};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "PascalCase")]
/// struct BalanceReply {
///     balances: Vec<serde_json::Value>,
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), ClientError> {
/// let client = LitClient::builder().connect().await?;
/// let reply: BalanceReply = client
///     .invoke("LitRPC.Balance", &serde_json::json!({}))
///     .await?;
/// println!("{} balances", reply.balances.len());
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct LitClient<K: Connector = WebSocketConnector> {
    connector: K,
    endpoint: Endpoint,
    max_message_size: usize,
    tracing_config: TracingConfig,
    shared: Arc<SharedConnection>,
    sink: Mutex<Option<K::Sink>>,
    receive_loop: Mutex<Option<ReceiveLoopHandle<K::Source>>>,
    shutdown: CancellationToken,
}

impl<K: Connector> fmt::Debug for LitClient<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LitClient")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .field("pending", &self.pending_requests())
            .finish_non_exhaustive()
    }
}

impl LitClient<WebSocketConnector> {
    /// Start building a client that talks WebSocket to a local node.
    ///
    /// # Examples
    ///
    /// ```
    /// use litrpc::{ConnectionState, LitClient};
    ///
    /// let client = LitClient::builder().port(8002).build();
    /// assert_eq!(client.state(), ConnectionState::Disconnected);
    /// ```
    #[must_use]
    pub fn builder() -> LitClientBuilder<WebSocketConnector> { LitClientBuilder::new() }
}

/// Removes an abandoned call from the pending table when its future is
/// dropped before a reply arrives.
struct InFlight<'a> {
    correlator: &'a RequestCorrelator,
    id: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) { self.correlator.fail(self.id, ClientError::ConnectionClosed); }
}

impl<K: Connector> LitClient<K> {
    pub(crate) fn from_parts(
        connector: K,
        endpoint: Endpoint,
        max_message_size: usize,
        tracing_config: TracingConfig,
        hooks: LifecycleHooks,
    ) -> Self {
        Self {
            connector,
            endpoint,
            max_message_size,
            tracing_config,
            shared: Arc::new(SharedConnection::new(hooks)),
            sink: Mutex::new(None),
            receive_loop: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState { self.shared.state() }

    /// Number of calls awaiting a reply.
    #[must_use]
    pub fn pending_requests(&self) -> usize { self.shared.correlator.len() }

    /// Endpoint this client connects to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint { &self.endpoint }

    /// Largest inbound message the receive loop will reassemble.
    #[must_use]
    pub const fn max_message_size(&self) -> usize { self.max_message_size }

    /// Open the connection and start reading replies.
    ///
    /// The setup hook runs once the transport is open, before the receive
    /// loop starts. If an error hook is registered, it is invoked before an
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the transport cannot be opened,
    /// [`ClientError::AlreadyConnected`] if the client is connecting or open,
    /// and [`ClientError::ConnectionClosed`] if it has been closed. A failed
    /// attempt leaves the client `Disconnected` so it may be retried.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let span = connect_span(&self.tracing_config, &self.endpoint.url());
        let timer = start_timer(self.tracing_config.connect_timing);
        let result = self.open().instrument(span.clone()).await;
        span.record("result", result_label(&result));
        emit_timing_event(&span, timer);
        if let Err(ref e) = result {
            self.shared.hooks.error(e).await;
        }
        result
    }

    async fn open(&self) -> Result<(), ClientError> {
        self.shared.begin_connect()?;
        let (sink, source) = match self.connector.connect(&self.endpoint).await {
            Ok(halves) => halves,
            Err(e) => {
                warn!("failed to connect to {}: {e}", self.endpoint);
                self.shared
                    .transition(ConnectionState::Connecting, ConnectionState::Disconnected);
                return Err(e.into());
            }
        };

        // Held until the loop is stored so a concurrent disconnect sees it.
        let mut running = self.receive_loop.lock().await;
        *self.sink.lock().await = Some(sink);
        if !self
            .shared
            .transition(ConnectionState::Connecting, ConnectionState::Open)
        {
            // disconnect() ran while the transport was opening.
            self.close_sink().await;
            return Err(ClientError::ConnectionClosed);
        }
        info!("connected to {}", self.endpoint);
        self.shared.hooks.connected().await;
        *running = Some(receive_loop::spawn(
            source,
            Arc::clone(&self.shared),
            self.max_message_size,
            self.shutdown.child_token(),
        ));
        Ok(())
    }

    /// Close the connection and fail every outstanding call.
    ///
    /// Safe to call in any state and any number of times. Once it returns
    /// the client is `Closed`, the receive loop has exited and no call is
    /// left waiting. The teardown hook runs if the connection was open.
    /// Errors while closing the transport are logged, not returned.
    pub async fn disconnect(&self) {
        let span = disconnect_span(&self.tracing_config);
        let timer = start_timer(self.tracing_config.disconnect_timing);
        let drained = self.shut_down().instrument(span.clone()).await;
        span.record("drained", drained);
        emit_timing_event(&span, timer);
    }

    async fn shut_down(&self) -> usize {
        let previous = self.shared.close();
        self.close_sink().await;
        let handle = self.receive_loop.lock().await.take();
        if let Some(handle) = handle {
            drop(handle.stop().await);
        }
        if previous.is_open() {
            info!("disconnected from {}", self.endpoint);
        }
        self.shared.finish(previous).await
    }

    async fn close_sink(&self) {
        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink
            && let Err(e) = sink.close().await
        {
            warn!("failed to close transport cleanly: {e}");
        }
    }

    /// Replace the receive loop with a fresh one over the same transport.
    ///
    /// The running loop is cancelled and awaited first, so at most one loop
    /// reads the transport. A partially received message is discarded.
    /// Pending calls are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] before `connect` and
    /// [`ClientError::ConnectionClosed`] once the connection has ended.
    pub async fn restart_receive_loop(&self) -> Result<(), ClientError> {
        let mut running = self.receive_loop.lock().await;
        self.ensure_open()?;
        let source = match running.take() {
            Some(handle) => handle.stop().await,
            None => None,
        };
        let Some(source) = source else {
            return Err(ClientError::ConnectionClosed);
        };
        *running = Some(receive_loop::spawn(
            source,
            Arc::clone(&self.shared),
            self.max_message_size,
            self.shutdown.child_token(),
        ));
        log::debug!("receive loop restarted");
        Ok(())
    }

    /// Call `method` with `request` and decode the reply `result` as JSON.
    ///
    /// # Errors
    ///
    /// See [`invoke_with`](Self::invoke_with).
    pub async fn invoke<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned + Send + 'static,
    {
        self.invoke_with(method, request, |raw: &[u8]| {
            serde_json::from_slice::<Resp>(raw)
        })
        .await
    }

    /// Call `method` with `request` and decode the reply with `decode`.
    ///
    /// `decode` receives the raw JSON of the reply's `result`, or `null` if
    /// the reply had none. It is not called when the node reports an error.
    /// If an error hook is registered, it is invoked before an error is
    /// returned.
    ///
    /// Dropping the returned future abandons the call; a late reply for it
    /// is discarded.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotConnected`] or [`ClientError::ConnectionClosed`] if
    ///   the client is not open.
    /// - [`ClientError::Serialize`] if `request` cannot be encoded.
    /// - [`ClientError::Connection`] if sending fails; the connection is then
    ///   torn down.
    /// - [`ClientError::Remote`] with the node's error text.
    /// - [`ClientError::Decode`] if `decode` rejects the result.
    /// - [`ClientError::ConnectionClosed`] if the connection ends first.
    pub async fn invoke_with<Req, T, D, E>(
        &self,
        method: &str,
        request: &Req,
        decode: D,
    ) -> Result<T, ClientError>
    where
        Req: Serialize + ?Sized,
        T: Send + 'static,
        D: FnOnce(&[u8]) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let span = invoke_span(&self.tracing_config, method);
        let timer = start_timer(self.tracing_config.invoke_timing);
        let result = self
            .call(method, request, decode)
            .instrument(span.clone())
            .await;
        span.record("result", result_label(&result));
        emit_timing_event(&span, timer);

        match &result {
            Ok(_) => metrics::inc_calls(CallOutcome::Ok),
            Err(e) => {
                metrics::inc_calls(if e.remote_message().is_some() {
                    CallOutcome::Remote
                } else {
                    CallOutcome::Failed
                });
                self.shared.hooks.error(e).await;
            }
        }
        result
    }

    async fn call<Req, T, D, E>(&self, method: &str, request: &Req, decode: D) -> Result<T, ClientError>
    where
        Req: Serialize + ?Sized,
        T: Send + 'static,
        D: FnOnce(&[u8]) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.ensure_open()?;
        let correlator = &self.shared.correlator;
        let id = correlator.next_id();
        Span::current().record("rpc.id", id);

        let payload = encode_request(id, method, request).map_err(ClientError::Serialize)?;
        let (pending, reply) = PendingRequest::channel(id, decode);
        correlator.register(pending)?;
        let _in_flight = InFlight { correlator, id };

        if let Err(e) = self.send(Bytes::from(payload)).await {
            let fatal = matches!(e, ClientError::Connection(_));
            correlator.fail(id, e);
            if fatal {
                self.shut_down().await;
            }
        }
        reply.await
    }

    async fn send(&self, message: Bytes) -> Result<(), ClientError> {
        let mut sink = self.sink.lock().await;
        let sink = sink.as_mut().ok_or(ClientError::ConnectionClosed)?;
        sink.send_message(message).await.map_err(ClientError::from)
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        match self.state() {
            ConnectionState::Open => Ok(()),
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                Err(ClientError::NotConnected)
            }
            ConnectionState::Closed => Err(ClientError::ConnectionClosed),
        }
    }
}

impl<K: Connector> Drop for LitClient<K> {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.shared.close();
        self.shared
            .correlator
            .drain_with_error(|| ClientError::ConnectionClosed);
    }
}
