//! Command line interface for the `litrpc` binary.
//!
//! Issues a single raw call against a node and prints the reply.

use clap::Parser;
use litrpc::endpoint::{DEFAULT_HOST, DEFAULT_ORIGIN, DEFAULT_PORT};
use serde_json::Value;

/// Command line arguments for the `litrpc` binary.
#[derive(Debug, Parser)]
#[command(name = "litrpc", version, about = "Call a LIT node RPC method")]
pub struct Cli {
    /// Node host name or address.
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,
    /// Node RPC port.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Value of the `Origin` header sent during the handshake.
    #[arg(long, default_value = DEFAULT_ORIGIN)]
    pub origin: String,
    /// Method to call, e.g. `LitRPC.Balance`.
    pub method: String,
    /// Request object as JSON.
    #[arg(default_value = "{}", value_parser = parse_params)]
    pub params: Value,
}

fn parse_params(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("params must be JSON: {e}"))
}
