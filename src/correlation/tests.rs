//! Unit tests for the request correlator.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rstest::{fixture, rstest};
use serde::Deserialize;

use super::*;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct BalanceReply {
    balances: Vec<u64>,
}

fn json_entry<T>(id: u64) -> (PendingRequest, ReplyFuture<T>)
where
    T: serde::de::DeserializeOwned + Send + 'static,
{
    PendingRequest::channel(id, |raw: &[u8]| serde_json::from_slice::<T>(raw))
}

#[fixture]
fn correlator() -> RequestCorrelator { RequestCorrelator::new() }

#[rstest]
fn ids_start_at_one_and_increase(correlator: RequestCorrelator) {
    let ids: Vec<u64> = (0..5).map(|_| correlator.next_id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[rstest]
fn zero_is_skipped_on_wrap(correlator: RequestCorrelator) {
    correlator.next_id.store(u64::MAX, Ordering::Relaxed);
    assert_eq!(correlator.next_id(), u64::MAX);
    assert_eq!(correlator.next_id(), 1);
}

#[tokio::test]
async fn concurrent_allocation_yields_unique_ids() {
    let correlator = Arc::new(RequestCorrelator::new());
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let correlator = correlator.clone();
        tasks.push(tokio::spawn(async move {
            (0..250).map(|_| correlator.next_id()).collect::<Vec<_>>()
        }));
    }
    let mut all = Vec::new();
    for task in tasks {
        all.extend(task.await.expect("allocation task"));
    }
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 2000);
    assert!(!all.contains(&UNADDRESSED_ID));
}

#[rstest]
#[tokio::test]
async fn resolve_decodes_matching_entry(correlator: RequestCorrelator) {
    let (entry, reply) = json_entry::<BalanceReply>(1);
    correlator.register(entry).expect("register");

    assert!(correlator.resolve(1, br#"{"Balances":[]}"#));
    assert_eq!(
        reply.await.expect("reply decoded"),
        BalanceReply { balances: vec![] }
    );
    assert!(correlator.is_empty());
}

#[rstest]
#[case::unknown(99)]
#[case::unaddressed(UNADDRESSED_ID)]
#[tokio::test]
async fn unmatched_ids_are_ignored(correlator: RequestCorrelator, #[case] id: u64) {
    let (entry, _reply) = json_entry::<BalanceReply>(1);
    correlator.register(entry).expect("register");

    assert!(!correlator.resolve(id, b"{}"));
    assert!(!correlator.fail(id, ClientError::Remote("ignored".into())));
    assert_eq!(correlator.len(), 1);
}

#[rstest]
#[tokio::test]
async fn fail_skips_decoding(correlator: RequestCorrelator) {
    let decoded = Arc::new(AtomicUsize::new(0));
    let seen = decoded.clone();
    let (entry, reply) = PendingRequest::channel(3, move |_raw: &[u8]| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok::<_, serde_json::Error>(())
    });
    correlator.register(entry).expect("register");

    assert!(correlator.fail(3, ClientError::Remote("peer not found".into())));
    let err = reply.await.expect_err("remote error");
    assert_eq!(err.remote_message(), Some("peer not found"));
    assert_eq!(decoded.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn decode_failure_fails_only_that_call(correlator: RequestCorrelator) {
    let (bad, bad_reply) = json_entry::<BalanceReply>(1);
    let (good, good_reply) = json_entry::<BalanceReply>(2);
    correlator.register(bad).expect("register");
    correlator.register(good).expect("register");

    correlator.resolve(1, br#"{"Balances":"nope"}"#);
    correlator.resolve(2, br#"{"Balances":[5]}"#);

    assert!(matches!(bad_reply.await, Err(ClientError::Decode(_))));
    assert_eq!(
        good_reply.await.expect("good reply"),
        BalanceReply { balances: vec![5] }
    );
}

#[rstest]
fn duplicate_ids_are_rejected(correlator: RequestCorrelator) {
    let (first, _first_reply) = json_entry::<()>(4);
    let (second, _second_reply) = json_entry::<()>(4);
    correlator.register(first).expect("register");
    assert!(matches!(
        correlator.register(second),
        Err(ClientError::DuplicateId(4))
    ));
    assert_eq!(correlator.len(), 1);
}

#[rstest]
#[tokio::test]
async fn entries_leave_the_table_once(correlator: RequestCorrelator) {
    let (entry, reply) = json_entry::<u32>(5);
    correlator.register(entry).expect("register");

    assert!(correlator.resolve(5, b"7"));
    assert!(!correlator.resolve(5, b"8"));
    assert!(!correlator.fail(5, ClientError::ConnectionClosed));
    assert_eq!(reply.await.expect("first reply wins"), 7);
}

#[rstest]
#[tokio::test]
async fn drain_fails_everything_and_closes(correlator: RequestCorrelator) {
    let replies: Vec<_> = (1..=3)
        .map(|id| {
            let (entry, reply) = json_entry::<u32>(id);
            correlator.register(entry).expect("register");
            reply
        })
        .collect();

    assert_eq!(correlator.drain_with_error(|| ClientError::ConnectionClosed), 3);
    assert!(correlator.is_closed());
    for reply in replies {
        assert!(matches!(reply.await, Err(ClientError::ConnectionClosed)));
    }

    let (late, late_reply) = json_entry::<u32>(9);
    assert!(matches!(
        correlator.register(late),
        Err(ClientError::ConnectionClosed)
    ));
    assert!(matches!(late_reply.await, Err(ClientError::ConnectionClosed)));
    assert_eq!(correlator.drain_with_error(|| ClientError::ConnectionClosed), 0);
}

#[tokio::test]
async fn dropped_entry_resolves_as_closed() {
    let (entry, reply) = json_entry::<u32>(1);
    assert_eq!(reply.id(), 1);
    drop(entry);
    assert!(matches!(reply.await, Err(ClientError::ConnectionClosed)));
}
