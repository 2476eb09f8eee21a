//! tether operator console — connects to a listener and turns typed command
//! lines into protocol exchanges.
#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

use std::io::Write as _;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tether::{Action, Client, Error};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

/// Operator console for the tether remote-control channel.
#[derive(Parser)]
#[command(name = "tether", version, about)]
struct Cli {
    /// Listener address, HOST or HOST:PORT.
    addr: String,

    /// Seconds to wait on any bounded receive before abandoning the
    /// pending operation.
    #[arg(long, default_value_t = tether_proto::READ_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics stay out of the interactive console unless asked for.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let addr = if cli.addr.contains(':') {
        cli.addr.clone()
    } else {
        format!("{}:{}", cli.addr, tether_proto::DEFAULT_PORT)
    };

    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;
    println!("[+] Connected to {addr}");

    let (reader, writer) = stream.into_split();
    let mut client = Client::new(
        BufReader::new(reader),
        writer,
        Duration::from_secs(cli.timeout_secs),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("tether> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break; // stdin closed
        };
        if line.trim().is_empty() {
            continue;
        }

        match Action::classify(&line) {
            Action::Exit => {
                // Sent for the peer's benefit; no reply is awaited.
                let _ = client.send_line("exit").await;
                break;
            }
            Action::Download(name) => {
                match client.download(&name, render_progress("Downloading")).await {
                    Ok(bytes) => println!("[+] File '{name}' downloaded successfully ({bytes} bytes)"),
                    Err(e) => eprintln!("[-] Download failed: {e}"),
                }
            }
            Action::Send(name) => match client.send(&name, render_progress("Sending")).await {
                Ok(bytes) => println!("[+] File '{name}' sent successfully ({bytes} bytes)"),
                Err(Error::NotFound(_)) => eprintln!("[-] File '{name}' not found"),
                Err(e) => eprintln!("[-] Send failed: {e}"),
            },
            Action::Forward(cmd) => match client.forward(&cmd).await {
                Ok(reply) => print!("{}", String::from_utf8_lossy(&reply)),
                Err(e) => eprintln!("[-] {e}"),
            },
        }
    }

    Ok(())
}

/// Progress callback that redraws a percentage on one console line.
fn render_progress(label: &'static str) -> impl FnMut(u8) {
    let mut last = None;
    move |pct| {
        if last != Some(pct) {
            last = Some(pct);
            print!("{label}... {pct}%\r");
            let _ = std::io::stdout().flush();
            if pct == 100 {
                println!();
            }
        }
    }
}
