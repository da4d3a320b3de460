//! Pending call entries and the futures their callers await.

use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::oneshot;

use crate::error::{BoxError, ClientError};

type Completion = Box<dyn FnOnce(Result<&[u8], ClientError>) + Send + Sync>;

/// An outstanding call awaiting the reply that names its id.
///
/// The entry owns the decoder chosen by the caller, so the reply type is
/// fixed when the call is issued; the wire message never says what shape
/// `result` has.
pub struct PendingRequest {
    id: u64,
    completion: Completion,
}

impl PendingRequest {
    /// Create an entry for `id` and the future that resolves when it completes.
    ///
    /// `decode` runs on the raw `result` bytes of the matching reply. It is
    /// never called for replies that carry an error.
    pub fn channel<T, D, E>(id: u64, decode: D) -> (Self, ReplyFuture<T>)
    where
        T: Send + 'static,
        D: FnOnce(&[u8]) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let (tx, rx) = oneshot::channel();
        let completion: Completion = Box::new(move |outcome: Result<&[u8], ClientError>| {
            let result =
                outcome.and_then(|raw| decode(raw).map_err(|e| ClientError::Decode(e.into())));
            // The caller may have stopped waiting; that is not an error here.
            let _ = tx.send(result);
        });
        (Self { id, completion }, ReplyFuture { id, rx })
    }

    /// Id this entry is registered under.
    #[must_use]
    pub const fn id(&self) -> u64 { self.id }

    /// Complete the call by decoding `raw`.
    pub fn complete(self, raw: &[u8]) { (self.completion)(Ok(raw)); }

    /// Fail the call without decoding anything.
    pub fn fail(self, error: ClientError) { (self.completion)(Err(error)); }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Future resolving to the decoded reply of one call.
///
/// If the entry is dropped without being completed, the future resolves to
/// [`ClientError::ConnectionClosed`].
#[derive(Debug)]
pub struct ReplyFuture<T> {
    id: u64,
    rx: oneshot::Receiver<Result<T, ClientError>>,
}

impl<T> ReplyFuture<T> {
    /// Id of the call this future waits on.
    #[must_use]
    pub const fn id(&self) -> u64 { self.id }
}

impl<T> Future for ReplyFuture<T> {
    type Output = Result<T, ClientError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(ClientError::ConnectionClosed)))
    }
}
