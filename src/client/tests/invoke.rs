//! Request/reply tests for `invoke` and `invoke_with`.

use std::{sync::atomic::Ordering, time::Duration};

use rstest::rstest;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::helpers::{
    BrokenPipeConnector,
    connected_client,
    counting_hook,
    next_request,
    reply,
    request_id,
};
use crate::{
    client::{ClientError, ConnectionState, LitClientBuilder},
    transport::Fragment,
};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConnectArgs {
    lit_adr: String,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct StatusReply {
    status: String,
}

#[tokio::test]
async fn request_is_a_single_param_envelope() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let args = ConnectArgs {
        lit_adr: "ln1abc@127.0.0.1".into(),
    };

    let call = client.invoke::<_, StatusReply>("LitRPC.Connect", &args);
    let answer = async {
        let request = next_request(&mut peer).await;
        assert_eq!(request["method"], "LitRPC.Connect");
        assert_eq!(request["params"], json!([{ "LitAdr": "ln1abc@127.0.0.1" }]));
        reply(&peer, request_id(&request), &json!({ "Status": "connected" }));
    };
    let (result, ()) = tokio::join!(call, answer);

    assert_eq!(
        result.expect("reply"),
        StatusReply {
            status: "connected".into()
        }
    );
}

#[tokio::test]
async fn ids_start_at_one_and_increase() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let request = json!({});

    for expected in 1..=3 {
        let call = client.invoke::<_, Value>("LitRPC.Balance", &request);
        let answer = async {
            let id = request_id(&next_request(&mut peer).await);
            assert_eq!(id, expected);
            reply(&peer, id, &Value::Null);
        };
        let (result, ()) = tokio::join!(call, answer);
        assert_eq!(result.expect("reply"), Value::Null);
    }
}

#[tokio::test]
async fn replies_in_reverse_order_reach_their_callers() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let request = json!({});

    let first = client.invoke::<_, Value>("LitRPC.Connect", &request);
    let second = client.invoke::<_, Value>("LitRPC.ListConnections", &request);
    let answer = async {
        let a = next_request(&mut peer).await;
        let b = next_request(&mut peer).await;
        reply(&peer, request_id(&b), &json!({ "Connections": [] }));
        reply(&peer, request_id(&a), &json!({ "Status": "ok" }));
    };
    let (first, second, ()) = tokio::join!(first, second, answer);

    assert_eq!(first.expect("first"), json!({ "Status": "ok" }));
    assert_eq!(second.expect("second"), json!({ "Connections": [] }));
}

#[rstest]
#[case::peer_not_found("peer not found")]
#[case::insufficient("insufficient funds")]
#[tokio::test]
async fn remote_error_text_is_returned_verbatim(#[case] text: &str) {
    let (errors, on_error) = counting_hook();
    let (client, mut peer) =
        connected_client(|builder| builder.on_error(move |_| on_error())).await;
    let request = json!({});

    let call = client.invoke::<_, Value>("LitRPC.Send", &request);
    let answer = async {
        let id = request_id(&next_request(&mut peer).await);
        let message = json!({ "id": id, "result": { "ignored": true }, "error": text });
        peer.send_message(message.to_string()).expect("listening");
    };
    let (result, ()) = tokio::join!(call, answer);

    let err = result.expect_err("remote error");
    assert_eq!(err.remote_message(), Some(text));
    assert_eq!(err.to_string(), text);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(client.state(), ConnectionState::Open);
}

#[tokio::test]
async fn decode_failure_leaves_connection_usable() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let request = json!({});

    let call = client.invoke::<_, StatusReply>("LitRPC.Connect", &request);
    let answer = async {
        let id = request_id(&next_request(&mut peer).await);
        reply(&peer, id, &json!([1, 2, 3]));
    };
    let (result, ()) = tokio::join!(call, answer);
    assert!(matches!(result, Err(ClientError::Decode(_))));

    let call = client.invoke::<_, StatusReply>("LitRPC.Connect", &request);
    let answer = async {
        let id = request_id(&next_request(&mut peer).await);
        reply(&peer, id, &json!({ "Status": "connected" }));
    };
    let (result, ()) = tokio::join!(call, answer);
    assert_eq!(result.expect("second call").status, "connected");
}

#[tokio::test]
async fn unsolicited_reply_is_dropped() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let request = json!({});

    let call = client.invoke::<_, Value>("LitRPC.Balance", &request);
    let answer = async {
        let id = request_id(&next_request(&mut peer).await);
        reply(&peer, 99, &json!("stray"));
        reply(&peer, 0, &json!("unaddressed"));
        reply(&peer, id, &json!("mine"));
    };
    let (result, ()) = tokio::join!(call, answer);

    assert_eq!(result.expect("reply"), json!("mine"));
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn fragmented_reply_is_reassembled() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let request = json!({});

    let call = client.invoke::<_, Value>("LitRPC.Balance", &request);
    let answer = async {
        let id = request_id(&next_request(&mut peer).await);
        let message = json!({ "id": id, "result": { "Balances": [1, 2] } }).to_string();
        let (head, tail) = message.as_bytes().split_at(message.len() / 2);
        peer.send_fragment(Fragment::new(head.to_vec(), false))
            .expect("listening");
        peer.send_fragment(Fragment::new(tail.to_vec(), true))
            .expect("listening");
    };
    let (result, ()) = tokio::join!(call, answer);

    assert_eq!(result.expect("reply"), json!({ "Balances": [1, 2] }));
}

#[tokio::test]
async fn missing_result_decodes_as_null() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let request = json!({});

    let call = client.invoke::<_, ()>("LitRPC.Stop", &request);
    let answer = async {
        let id = request_id(&next_request(&mut peer).await);
        peer.send_message(format!(r#"{{"id":{id},"error":null}}"#))
            .expect("listening");
    };
    let (result, ()) = tokio::join!(call, answer);

    result.expect("unit reply");
}

#[tokio::test]
async fn invoke_with_uses_the_supplied_decoder() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let request = json!({});

    let call = client.invoke_with("LitRPC.Balance", &request, |raw: &[u8]| {
        std::str::from_utf8(raw).map(str::len)
    });
    let answer = async {
        let id = request_id(&next_request(&mut peer).await);
        peer.send_message(format!(r#"{{"id":{id},"result":[1,2]}}"#))
            .expect("listening");
    };
    let (result, ()) = tokio::join!(call, answer);

    assert_eq!(result.expect("decoded"), "[1,2]".len());
}

#[tokio::test]
async fn unserialisable_request_is_rejected_before_sending() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let mut request = std::collections::HashMap::new();
    request.insert(vec![1_u8], 1);

    let err = client
        .invoke::<_, Value>("LitRPC.Balance", &request)
        .await
        .expect_err("serialize");

    assert!(matches!(err, ClientError::Serialize(_)));
    assert_eq!(client.pending_requests(), 0);
    client.disconnect().await;
    assert!(peer.recv_message().await.is_none(), "nothing was sent");
}

#[tokio::test]
async fn abandoned_call_leaves_the_table() {
    let (client, mut peer) = connected_client(|builder| builder).await;
    let request = json!({});

    let call = tokio::time::timeout(
        Duration::from_millis(20),
        client.invoke::<_, Value>("LitRPC.Balance", &request),
    );
    let (timed_out, request) = tokio::join!(call, next_request(&mut peer));
    assert!(timed_out.is_err());
    assert_eq!(client.pending_requests(), 0);

    // A late reply for the abandoned id is simply dropped.
    reply(&peer, request_id(&request), &json!("late"));
    assert_eq!(client.state(), ConnectionState::Open);
}

#[tokio::test]
async fn send_failure_tears_the_connection_down() {
    let (teardowns, on_teardown) = counting_hook();
    let client = LitClientBuilder::new()
        .connector(BrokenPipeConnector)
        .on_connection_teardown(move || on_teardown())
        .connect()
        .await
        .expect("connect");

    let err = client
        .invoke::<_, Value>("LitRPC.Balance", &json!({}))
        .await
        .expect_err("send fails");

    assert!(matches!(err, ClientError::Connection(_)));
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(client.pending_requests(), 0);
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}
