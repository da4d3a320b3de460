//! `litrpc` binary: call one RPC method on a LIT node.
//!
//! Prints the reply `result` as pretty JSON, or the error on stderr.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use litrpc::{ClientError, LitClient};
use serde_json::Value;

#[tokio::main]
async fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    match call(&cli).await {
        Ok(result) => {
            println!("{result:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", cli.method);
            ExitCode::FAILURE
        }
    }
}

async fn call(cli: &cli::Cli) -> Result<Value, ClientError> {
    let client = LitClient::builder()
        .host(cli.host.as_str())
        .port(cli.port)
        .origin(cli.origin.as_str())
        .connect()
        .await?;
    let result = client.invoke(&cli.method, &cli.params).await;
    client.disconnect().await;
    result
}
