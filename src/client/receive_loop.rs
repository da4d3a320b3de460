//! Background task that reads the transport and routes replies.
//!
//! One loop runs per open connection. It reassembles fragments into
//! messages, decodes each message as a reply envelope and completes or fails
//! the pending call the envelope names. Malformed messages are reported and
//! skipped; only the end of the stream, a transport error or cancellation
//! stops the loop.

use std::sync::Arc;

use log::{debug, warn};
use tokio::{select, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::state::SharedConnection;
use crate::{
    envelope::{ReplyOutcome, decode_reply},
    error::{ClientError, ProtocolError},
    frame::FrameAssembler,
    metrics,
    transport::{Fragment, FragmentSource},
};

/// Handle to a running receive loop.
///
/// Stopping the loop hands the transport source back so a replacement loop
/// can continue reading from it.
pub(crate) struct ReceiveLoopHandle<S> {
    token: CancellationToken,
    task: JoinHandle<Option<S>>,
}

impl<S> ReceiveLoopHandle<S> {
    /// Cancel the loop and wait for it to exit.
    ///
    /// Returns the source if the loop was still reading when cancelled, or
    /// `None` if it had already finished on its own.
    pub(crate) async fn stop(self) -> Option<S> {
        self.token.cancel();
        match self.task.await {
            Ok(source) => source,
            Err(e) => {
                if e.is_panic() {
                    warn!("receive loop panicked: {e}");
                }
                None
            }
        }
    }
}

/// Spawn a receive loop reading from `source`.
pub(crate) fn spawn<S: FragmentSource>(
    source: S,
    shared: Arc<SharedConnection>,
    max_message_size: usize,
    token: CancellationToken,
) -> ReceiveLoopHandle<S> {
    let task = tokio::spawn(run(
        source,
        shared,
        FrameAssembler::new(max_message_size),
        token.clone(),
    ));
    ReceiveLoopHandle { token, task }
}

async fn run<S: FragmentSource>(
    mut source: S,
    shared: Arc<SharedConnection>,
    mut assembler: FrameAssembler,
    token: CancellationToken,
) -> Option<S> {
    let failure = loop {
        let next = select! {
            biased;
            () = token.cancelled() => {
                debug!("receive loop cancelled");
                return Some(source);
            }
            next = source.next_fragment() => next,
        };
        match next {
            Some(Ok(fragment)) => route_fragment(&shared, &mut assembler, &fragment).await,
            Some(Err(e)) => break Some(e),
            None => break None,
        }
    };

    // The transport ended underneath us: nothing further can be answered.
    let previous = shared.close();
    match failure {
        Some(e) => {
            warn!("receive loop stopped on transport error: {e}");
            shared.hooks.error(&ClientError::Connection(e)).await;
        }
        None => debug!("transport stream ended"),
    }
    shared.finish(previous).await;
    None
}

async fn route_fragment(
    shared: &SharedConnection,
    assembler: &mut FrameAssembler,
    fragment: &Fragment,
) {
    let message = match assembler.push(fragment) {
        Ok(Some(message)) => message,
        Ok(None) => return,
        Err(e) => return report_protocol_error(shared, e).await,
    };
    let envelope = match decode_reply(&message) {
        Ok(envelope) => envelope,
        Err(e) => return report_protocol_error(shared, e).await,
    };

    let (id, outcome) = envelope.into_outcome();
    let routed = match outcome {
        ReplyOutcome::Error(message) => shared.correlator.fail(id, ClientError::Remote(message)),
        ReplyOutcome::Result(raw) => shared.correlator.resolve(id, &raw),
    };
    if !routed {
        debug!("dropping reply for unknown request id {id}");
        metrics::inc_dropped_replies();
    }
}

async fn report_protocol_error(shared: &SharedConnection, error: ProtocolError) {
    warn!("discarding malformed message: {error}");
    metrics::inc_protocol_errors();
    shared.hooks.error(&ClientError::Protocol(error)).await;
}
