//! Unit tests for the LIT client runtime.

mod helpers;
mod invoke;

use rstest::rstest;

use super::*;
use crate::{endpoint::Endpoint, frame::DEFAULT_MAX_MESSAGE_SIZE};

#[rstest]
#[case(1, MIN_MESSAGE_SIZE)]
#[case(MIN_MESSAGE_SIZE, MIN_MESSAGE_SIZE)]
#[case(DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_MAX_MESSAGE_SIZE)]
#[case(MAX_MESSAGE_SIZE + 1, MAX_MESSAGE_SIZE)]
fn builder_clamps_max_message_size(#[case] input: usize, #[case] expected: usize) {
    let client = LitClientBuilder::new().max_message_size(input).build();
    assert_eq!(client.max_message_size(), expected);
}

#[test]
fn builder_defaults_target_local_node() {
    let client = LitClient::builder().build();
    assert_eq!(client.endpoint(), &Endpoint::default());
    assert_eq!(client.endpoint().url(), "ws://localhost:8001/ws");
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.pending_requests(), 0);
}

#[test]
fn builder_endpoint_setters_compose() {
    let client = LitClient::builder()
        .host("10.0.0.2")
        .port(8002)
        .origin("http://wallet.local/")
        .build();
    let endpoint = client.endpoint();
    assert_eq!(endpoint.url(), "ws://10.0.0.2:8002/ws");
    assert_eq!(endpoint.origin(), "http://wallet.local/");
}
