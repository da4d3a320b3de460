//! Connection state machine.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::debug;

use super::hooks::LifecycleHooks;
use crate::{correlation::RequestCorrelator, error::ClientError};

/// Lifecycle state of a [`LitClient`](crate::LitClient).
///
/// Transitions run `Disconnected → Connecting → Open → Closed`. A failed
/// connection attempt falls back to `Disconnected`; nothing leaves `Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport has been opened yet.
    Disconnected,
    /// The transport is being opened.
    Connecting,
    /// Calls may be issued.
    Open,
    /// The connection has ended and cannot be reopened.
    Closed,
}

impl ConnectionState {
    /// Whether calls may be issued in this state.
    #[must_use]
    pub const fn is_open(self) -> bool { matches!(self, Self::Open) }

    fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// State shared between a client and its receive loop.
pub(crate) struct SharedConnection {
    state: Mutex<ConnectionState>,
    pub(crate) correlator: RequestCorrelator,
    pub(crate) hooks: LifecycleHooks,
}

impl SharedConnection {
    pub(crate) fn new(hooks: LifecycleHooks) -> Self {
        Self {
            state: Mutex::new(ConnectionState::Disconnected),
            correlator: RequestCorrelator::new(),
            hooks,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> ConnectionState { *self.lock() }

    /// Move from `Disconnected` to `Connecting`.
    pub(crate) fn begin_connect(&self) -> Result<(), ClientError> {
        let mut state = self.lock();
        match *state {
            ConnectionState::Disconnected => {
                *state = ConnectionState::Connecting;
                Ok(())
            }
            ConnectionState::Connecting | ConnectionState::Open => {
                Err(ClientError::AlreadyConnected)
            }
            ConnectionState::Closed => Err(ClientError::ConnectionClosed),
        }
    }

    /// Set `to` only if the current state is `from`.
    pub(crate) fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        let mut state = self.lock();
        if *state != from {
            return false;
        }
        *state = to;
        true
    }

    /// Mark the connection closed, returning the state it left.
    pub(crate) fn close(&self) -> ConnectionState {
        std::mem::replace(&mut *self.lock(), ConnectionState::Closed)
    }

    /// Fail every pending call and run the teardown hook if `previous` was
    /// the open state. Returns the number of calls failed.
    pub(crate) async fn finish(&self, previous: ConnectionState) -> usize {
        let drained = self
            .correlator
            .drain_with_error(|| ClientError::ConnectionClosed);
        if drained > 0 {
            debug!("failed {drained} pending calls on teardown");
        }
        if previous.is_open() {
            self.hooks.disconnected().await;
        }
        drained
    }
}
