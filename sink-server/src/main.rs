//! A local receiving endpoint for trial runs of the load generator.
//!
//! Answers every request with a fixed status and body, and reports how many it has received
//! on `GET /count`.

use std::net::SocketAddr;

use anyhow::Context;
use argh::FromArgs;
use http_test_util::sink::{router, SinkReply, SinkState};
use hyper::StatusCode;
use tracing_subscriber::EnvFilter;

/// Accept and count JSON posts.
#[derive(Debug, FromArgs)]
struct Args {
    /// address to listen on
    #[argh(option, default = "SocketAddr::from(([127, 0, 0, 1], 5080))")]
    addr: SocketAddr,

    /// status code to answer with
    #[argh(option, default = "200")]
    status: u16,

    /// response body to answer with
    #[argh(option, default = "String::from(\"ok\")")]
    body: String,
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let _guard = rt.enter();
    rt.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    let status = StatusCode::from_u16(args.status)
        .with_context(|| format!("invalid status code {}", args.status))?;
    let state = SinkState::counting(SinkReply::new(status, args.body));

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;
    tracing::info!(addr = %args.addr, %status, "sink listening");

    axum::serve(listener, router(state))
        .await
        .context("sink server stopped")
}
