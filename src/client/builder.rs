//! Builder for configuring and connecting a LIT client.

use std::{future::Future, sync::Arc};

use super::{ClientError, LitClient, TracingConfig, hooks::LifecycleHooks};
use crate::{
    endpoint::Endpoint,
    frame::DEFAULT_MAX_MESSAGE_SIZE,
    transport::{Connector, WebSocketConnector},
};

/// Smallest accepted message size limit.
pub const MIN_MESSAGE_SIZE: usize = 64;
/// Largest accepted message size limit.
pub const MAX_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

/// Builder for [`LitClient`].
///
/// The type parameter `K` selects the transport connector, defaulting to
/// [`WebSocketConnector`].
///
/// # Examples
///
/// ```
/// use litrpc::{Endpoint, client::LitClientBuilder};
///
/// let client = LitClientBuilder::new()
///     .endpoint(Endpoint::new("127.0.0.1", 8001))
///     .build();
/// assert_eq!(client.endpoint().url(), "ws://127.0.0.1:8001/ws");
/// ```
pub struct LitClientBuilder<K = WebSocketConnector> {
    connector: K,
    endpoint: Endpoint,
    max_message_size: usize,
    tracing_config: TracingConfig,
    hooks: LifecycleHooks,
}

impl LitClientBuilder<WebSocketConnector> {
    /// Create a builder targeting the default local node endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connector: WebSocketConnector,
            endpoint: Endpoint::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            tracing_config: TracingConfig::default(),
            hooks: LifecycleHooks::default(),
        }
    }
}

impl Default for LitClientBuilder<WebSocketConnector> {
    fn default() -> Self { Self::new() }
}

impl<K: Connector> LitClientBuilder<K> {
    /// Replace the transport connector.
    ///
    /// # Examples
    ///
    /// ```
    /// use litrpc::{client::LitClientBuilder, transport::channel_pair};
    ///
    /// let (connector, _peer) = channel_pair();
    /// let client = LitClientBuilder::new().connector(connector).build();
    /// let _ = client;
    /// ```
    #[must_use]
    pub fn connector<K2: Connector>(self, connector: K2) -> LitClientBuilder<K2> {
        LitClientBuilder {
            connector,
            endpoint: self.endpoint,
            max_message_size: self.max_message_size,
            tracing_config: self.tracing_config,
            hooks: self.hooks,
        }
    }

    /// Set the node endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Set the node host, keeping the rest of the endpoint.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.with_host(host);
        self
    }

    /// Set the node RPC port, keeping the rest of the endpoint.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.endpoint = self.endpoint.with_port(port);
        self
    }

    /// Set the `Origin` header sent during the handshake.
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.with_origin(origin);
        self
    }

    /// Cap the size of a reassembled inbound message.
    ///
    /// The value is clamped to `MIN_MESSAGE_SIZE..=MAX_MESSAGE_SIZE`.
    #[must_use]
    pub fn max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes.clamp(MIN_MESSAGE_SIZE, MAX_MESSAGE_SIZE);
        self
    }

    /// Configure tracing span levels and timing.
    #[must_use]
    pub fn tracing_config(mut self, config: TracingConfig) -> Self {
        self.tracing_config = config;
        self
    }

    /// Register a callback invoked once the connection is open.
    ///
    /// # Examples
    ///
    /// ```
    /// use litrpc::client::LitClientBuilder;
    ///
    /// let builder = LitClientBuilder::new().on_connection_setup(|| async {
    ///     println!("connected");
    /// });
    /// let _ = builder;
    /// ```
    #[must_use]
    pub fn on_connection_setup<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks.on_connect = Some(Arc::new(move || Box::pin(f())));
        self
    }

    /// Register a callback invoked once when an open connection ends.
    #[must_use]
    pub fn on_connection_teardown<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks.on_disconnect = Some(Arc::new(move || Box::pin(f())));
        self
    }

    /// Register a callback invoked when an error occurs.
    ///
    /// # Examples
    ///
    /// ```
    /// use litrpc::client::LitClientBuilder;
    ///
    /// let builder = LitClientBuilder::new().on_error(|err| {
    ///     let message = err.to_string();
    ///     async move { eprintln!("client error: {message}") }
    /// });
    /// let _ = builder;
    /// ```
    #[must_use]
    pub fn on_error<F, Fut>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a ClientError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks.on_error = Some(Arc::new(move |e| Box::pin(f(e))));
        self
    }

    /// Build a client in the `Disconnected` state.
    #[must_use]
    pub fn build(self) -> LitClient<K> {
        LitClient::from_parts(
            self.connector,
            self.endpoint,
            self.max_message_size,
            self.tracing_config,
            self.hooks,
        )
    }

    /// Build the client and connect it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the transport cannot be opened.
    pub async fn connect(self) -> Result<LitClient<K>, ClientError> {
        let client = self.build();
        client.connect().await?;
        Ok(client)
    }
}
