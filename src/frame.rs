//! Reassembly of transport fragments into complete messages.
//!
//! [`FrameAssembler`] accumulates fragment payloads byte-for-byte until the
//! transport flags a fragment as final. It guards against unbounded
//! allocation with a configurable cap: a message that grows past the cap is
//! reported once and the rest of its fragments are skipped.

use bytes::{Bytes, BytesMut};

use crate::{error::ProtocolError, transport::Fragment};

/// Default upper bound on a reassembled message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Stateful fragment accumulator for a single connection.
#[derive(Debug)]
pub struct FrameAssembler {
    max_message_size: usize,
    buffer: BytesMut,
    discarding: bool,
}

impl Default for FrameAssembler {
    fn default() -> Self { Self::new(DEFAULT_MAX_MESSAGE_SIZE) }
}

impl FrameAssembler {
    /// Create an assembler that rejects messages longer than `max_message_size`.
    #[must_use]
    pub fn new(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            buffer: BytesMut::new(),
            discarding: false,
        }
    }

    /// Maximum accepted message size in bytes.
    #[must_use]
    pub const fn max_message_size(&self) -> usize { self.max_message_size }

    /// Number of bytes buffered for the message in progress.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffer.len() }

    /// Feed one fragment.
    ///
    /// Returns `Ok(Some(_))` when the fragment completes a message and
    /// `Ok(None)` while more fragments are required.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MessageTooLarge`] on the fragment that pushes
    /// the message past the cap. Later fragments of the same message are
    /// dropped silently; the assembler is ready for the next message once the
    /// final fragment has gone by.
    pub fn push(&mut self, fragment: &Fragment) -> Result<Option<Bytes>, ProtocolError> {
        if self.discarding {
            if fragment.is_final() {
                self.discarding = false;
            }
            return Ok(None);
        }

        if self.buffer.len() + fragment.payload().len() > self.max_message_size {
            self.buffer.clear();
            self.discarding = !fragment.is_final();
            return Err(ProtocolError::MessageTooLarge {
                limit: self.max_message_size,
            });
        }

        self.buffer.extend_from_slice(fragment.payload());
        if fragment.is_final() {
            Ok(Some(self.buffer.split().freeze()))
        } else {
            Ok(None)
        }
    }

    /// Drop any partially assembled message.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }
}
