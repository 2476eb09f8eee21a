//! tether listener — binds a TCP port, serves one operator at a time, and
//! executes the commands it receives.
#![allow(clippy::missing_docs_in_private_items)]

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tether::{Session, SessionEnd};
use tokio::io::{BufReader, BufWriter};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Listener endpoint for the tether remote-control channel.
#[derive(Parser, Debug)]
#[command(name = "tether-agent", version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// TCP port to listen on.
    #[arg(long, default_value_t = tether_proto::DEFAULT_PORT)]
    port: u16,

    /// Seconds to wait on any bounded receive before abandoning the
    /// pending operation.
    #[arg(long, default_value_t = tether_proto::READ_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let listener = TcpListener::bind((args.bind.as_str(), args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.bind, args.port))?;
    info!(bind = %args.bind, port = args.port, "listening");

    let window = Duration::from_secs(args.timeout_secs);

    // One connection at a time: the next operator is accepted only after the
    // current session has fully ended.
    loop {
        let (stream, peer) = listener.accept().await.context("accept failed")?;
        info!(%peer, "connection accepted");

        let (reader, writer) = stream.into_split();
        let mut session = Session::new(BufReader::new(reader), BufWriter::new(writer), window)
            .context("failed to resolve working directory")?;

        match session.run().await {
            Ok(SessionEnd::Terminated) => {
                info!(%peer, "terminated by operator");
                return Ok(());
            }
            Ok(SessionEnd::Disconnected) => info!(%peer, "peer disconnected"),
            Err(e) => error!(%peer, error = %e, "session failed"),
        }
    }
}
