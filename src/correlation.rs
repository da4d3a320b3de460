//! Correlation of replies with the calls that are waiting for them.
//!
//! [`RequestCorrelator`] allocates request ids and owns the table of pending
//! calls. Caller tasks register entries while the receive loop resolves or
//! fails them, so every operation is safe under concurrent use. The table is
//! closed by [`drain_with_error`](RequestCorrelator::drain_with_error) on
//! teardown; entries registered afterwards are failed immediately.

mod pending;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::{DashMap, mapref::entry::Entry};

pub use pending::{PendingRequest, ReplyFuture};

use crate::{error::ClientError, metrics};

/// Id that never names a call.
pub const UNADDRESSED_ID: u64 = 0;

/// Per-connection id allocator and pending-call table.
#[derive(Debug)]
pub struct RequestCorrelator {
    next_id: AtomicU64,
    pending: DashMap<u64, PendingRequest>,
    closed: AtomicBool,
}

impl Default for RequestCorrelator {
    fn default() -> Self { Self::new() }
}

impl RequestCorrelator {
    /// Create an empty correlator whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Allocate the next request id.
    ///
    /// Ids increase strictly and are never reused. `fetch_add` keeps them
    /// unique under concurrent callers; zero is skipped should the counter
    /// ever wrap.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id != UNADDRESSED_ID {
                return id;
            }
        }
    }

    /// Add an entry to the table.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DuplicateId`] if the id is already pending and
    /// [`ClientError::ConnectionClosed`] if the table has been drained. In both
    /// cases the entry's future resolves to [`ClientError::ConnectionClosed`].
    pub fn register(&self, request: PendingRequest) -> Result<(), ClientError> {
        let id = request.id();
        if self.is_closed() {
            return Err(ClientError::ConnectionClosed);
        }
        match self.pending.entry(id) {
            Entry::Occupied(_) => return Err(ClientError::DuplicateId(id)),
            Entry::Vacant(slot) => {
                slot.insert(request);
            }
        }

        // A drain may have run between the check above and the insert.
        if self.is_closed() {
            if let Some((_, request)) = self.pending.remove(&id) {
                request.fail(ClientError::ConnectionClosed);
            }
            return Err(ClientError::ConnectionClosed);
        }
        metrics::set_pending(self.pending.len());
        Ok(())
    }

    /// Complete the entry for `id` by decoding `raw`.
    ///
    /// Unknown ids, including [`UNADDRESSED_ID`], are ignored. Returns whether
    /// an entry was completed.
    pub fn resolve(&self, id: u64, raw: &[u8]) -> bool {
        match self.take(id) {
            Some(request) => {
                request.complete(raw);
                true
            }
            None => false,
        }
    }

    /// Fail the entry for `id` with `error` without decoding.
    ///
    /// Returns whether an entry was failed.
    pub fn fail(&self, id: u64, error: ClientError) -> bool {
        match self.take(id) {
            Some(request) => {
                request.fail(error);
                true
            }
            None => false,
        }
    }

    /// Close the table and fail every remaining entry.
    ///
    /// Returns the number of entries failed by this call.
    pub fn drain_with_error<F>(&self, make_error: F) -> usize
    where
        F: Fn() -> ClientError,
    {
        self.closed.store(true, Ordering::SeqCst);
        let ids: Vec<u64> = self.pending.iter().map(|entry| *entry.key()).collect();
        let mut drained = 0;
        for id in ids {
            if let Some((_, request)) = self.pending.remove(&id) {
                request.fail(make_error());
                drained += 1;
            }
        }
        metrics::set_pending(self.pending.len());
        drained
    }

    /// Number of calls awaiting a reply.
    #[must_use]
    pub fn len(&self) -> usize { self.pending.len() }

    /// Whether no calls are awaiting a reply.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.pending.is_empty() }

    /// Whether the table has been drained and accepts no new entries.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::SeqCst) }

    fn take(&self, id: u64) -> Option<PendingRequest> {
        if id == UNADDRESSED_ID {
            return None;
        }
        let request = self.pending.remove(&id).map(|(_, request)| request);
        if request.is_some() {
            metrics::set_pending(self.pending.len());
        }
        request
    }
}

#[cfg(test)]
mod tests;
