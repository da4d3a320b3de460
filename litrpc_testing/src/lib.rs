//! Utilities for driving a [`LitClient`](litrpc::LitClient) against an
//! in-memory node during tests.
//!
//! [`MockDaemon`] plays the node's side of a channel transport: it reads the
//! requests the client sends and answers them in whatever order, shape or
//! fragmentation a test needs.
//!
//! ```rust
//! use litrpc_testing::connected_client;
//! use serde_json::{Value, json};
//!
//! # async fn example() {
//! let (client, mut daemon) = connected_client().await;
//! let request = json!({});
//! let call = client.invoke::<_, Value>("LitRPC.Balance", &request);
//! let answer = async {
//!     let request = daemon.next_request().await.expect("request");
//!     daemon.reply(request.id, &json!({ "Balances": [] }));
//! };
//! let (reply, ()) = tokio::join!(call, answer);
//! assert!(reply.is_ok());
//! # }
//! ```

pub mod logging;
pub mod mock_daemon;

pub use logging::{LoggerHandle, logger};
pub use mock_daemon::{MockDaemon, Request, connected_client, mock_daemon};
