//! Tracing configuration for LIT client operations.
//!
//! [`TracingConfig`] controls the level of the spans emitted around client
//! operations and whether per-operation elapsed-time events are recorded.

use tracing::Level;

/// Controls tracing span levels and per-operation timing.
///
/// By default `connect` and `disconnect` emit spans at `INFO` level and the
/// high-frequency `invoke` emits at `DEBUG`. Timing is off for everything.
/// When timing is enabled for an operation, an event recording `elapsed_us`
/// is emitted inside its span as it completes.
///
/// # Examples
///
/// ```
/// use litrpc::client::TracingConfig;
/// use tracing::Level;
///
/// let config = TracingConfig::default()
///     .with_invoke_level(Level::TRACE)
///     .with_invoke_timing(true);
/// let _ = config;
/// ```
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub(crate) connect_level: Level,
    pub(crate) invoke_level: Level,
    pub(crate) disconnect_level: Level,
    pub(crate) connect_timing: bool,
    pub(crate) invoke_timing: bool,
    pub(crate) disconnect_timing: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            connect_level: Level::INFO,
            invoke_level: Level::DEBUG,
            disconnect_level: Level::INFO,
            connect_timing: false,
            invoke_timing: false,
            disconnect_timing: false,
        }
    }
}

impl TracingConfig {
    /// Set the tracing level for the `connect` operation.
    #[must_use]
    pub fn with_connect_level(mut self, level: Level) -> Self {
        self.connect_level = level;
        self
    }

    /// Enable or disable timing for the `connect` operation.
    #[must_use]
    pub fn with_connect_timing(mut self, enabled: bool) -> Self {
        self.connect_timing = enabled;
        self
    }

    /// Set the tracing level for `invoke` and `invoke_with`.
    #[must_use]
    pub fn with_invoke_level(mut self, level: Level) -> Self {
        self.invoke_level = level;
        self
    }

    /// Enable or disable timing for `invoke` and `invoke_with`.
    ///
    /// The elapsed time covers the whole round trip, from allocating the id
    /// to the decoded reply.
    #[must_use]
    pub fn with_invoke_timing(mut self, enabled: bool) -> Self {
        self.invoke_timing = enabled;
        self
    }

    /// Set the tracing level for the `disconnect` operation.
    #[must_use]
    pub fn with_disconnect_level(mut self, level: Level) -> Self {
        self.disconnect_level = level;
        self
    }

    /// Enable or disable timing for the `disconnect` operation.
    #[must_use]
    pub fn with_disconnect_timing(mut self, enabled: bool) -> Self {
        self.disconnect_timing = enabled;
        self
    }

    /// Set the tracing level for all operations at once.
    ///
    /// # Examples
    ///
    /// ```
    /// use litrpc::client::TracingConfig;
    /// use tracing::Level;
    ///
    /// let config = TracingConfig::default().with_all_levels(Level::TRACE);
    /// let _ = config;
    /// ```
    #[must_use]
    pub fn with_all_levels(mut self, level: Level) -> Self {
        self.connect_level = level;
        self.invoke_level = level;
        self.disconnect_level = level;
        self
    }

    /// Enable or disable timing for all operations at once.
    #[must_use]
    pub fn with_all_timing(mut self, enabled: bool) -> Self {
        self.connect_timing = enabled;
        self.invoke_timing = enabled;
        self.disconnect_timing = enabled;
        self
    }
}
