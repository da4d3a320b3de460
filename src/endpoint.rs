//! Connection endpoint for a LIT node.

use std::fmt;

/// Host the node listens on unless configured otherwise.
pub const DEFAULT_HOST: &str = "localhost";
/// RPC port the node listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 8001;
/// Path of the node's WebSocket RPC handler.
pub const DEFAULT_PATH: &str = "/ws";
/// `Origin` header value the node accepts.
pub const DEFAULT_ORIGIN: &str = "http://localhost/";

/// Address and handshake headers used to reach a node.
///
/// # Examples
///
/// ```
/// use litrpc::Endpoint;
///
/// let endpoint = Endpoint::default().with_host("10.0.0.2").with_port(8002);
/// assert_eq!(endpoint.url(), "ws://10.0.0.2:8002/ws");
/// assert_eq!(endpoint.origin(), "http://localhost/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    path: String,
    origin: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl Endpoint {
    /// Create an endpoint for `host:port` with the default path and origin.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::default().with_host(host).with_port(port)
    }

    /// Set the host name or address.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the TCP port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the request path. A leading `/` is added when missing.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Set the `Origin` header sent during the handshake.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str { &self.host }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 { self.port }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str { &self.path }

    /// `Origin` header value.
    #[must_use]
    pub fn origin(&self) -> &str { &self.origin }

    /// WebSocket URL for this endpoint.
    #[must_use]
    pub fn url(&self) -> String { format!("ws://{}:{}{}", self.host, self.port, self.path) }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.url()) }
}
