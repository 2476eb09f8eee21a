//! Operator-side driver: classifies local input and speaks the protocol.

use std::path::Path;
use std::time::Duration;

use tether_proto as proto;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::error::Result;
use crate::transfer;

/// How one line of operator input is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fetch a file from the listener.
    Download(String),
    /// Push a file to the listener.
    Send(String),
    /// Stop the local loop without waiting for a reply.
    Exit,
    /// Forward verbatim and expect a framed reply.
    Forward(String),
}

impl Action {
    /// Classifies one line of local input. Trailing whitespace is ignored.
    pub fn classify(line: &str) -> Self {
        let line = line.trim_end();
        if line == "exit" {
            return Self::Exit;
        }
        if let Some((verb, rest)) = line.split_once(' ') {
            let arg = rest.trim();
            if !arg.is_empty() {
                match verb {
                    "download" => return Self::Download(arg.to_owned()),
                    "send" => return Self::Send(arg.to_owned()),
                    _ => {}
                }
            }
        }
        Self::Forward(line.to_owned())
    }
}

/// A connected operator endpoint.
///
/// Drives one command at a time over the channel: transfer commands run the
/// matching side of the transfer protocol; everything else is forwarded and
/// answered with one framed reply.
#[derive(Debug)]
pub struct Client<R, W> {
    /// Read half of the channel.
    reader: R,
    /// Write half of the channel.
    writer: W,
    /// Window applied to every bounded receive.
    window: Duration,
}

impl<R, W> Client<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wraps the connected channel halves.
    pub fn new(reader: R, writer: W, window: Duration) -> Self {
        Self {
            reader,
            writer,
            window,
        }
    }

    /// Fetches `name` from the listener into the same-named local file.
    ///
    /// Sends the literal `download <name>` header, then runs the receive
    /// side of the transfer protocol. On any failure the partial local file
    /// is already removed by the engine.
    pub async fn download(&mut self, name: &str, progress: impl FnMut(u8)) -> Result<u64> {
        self.download_to(name, Path::new(name), progress).await
    }

    /// Pushes the same-named local file to the listener as `name`.
    ///
    /// Sends the literal `send <name>` header, then streams the file. A
    /// missing local file still puts the plain notice on the wire, which the
    /// peer's receive loop abandons on its own timeout — that mismatch is
    /// inherited from the legacy protocol.
    pub async fn send(&mut self, name: &str, progress: impl FnMut(u8)) -> Result<u64> {
        self.send_from(name, Path::new(name), progress).await
    }

    /// Forwards one command line and returns the framed reply payload.
    ///
    /// The reply is assumed to be length-prefixed; commands that the
    /// listener answers in plain text (`cd`, `remove`) misparse into a bogus
    /// length and surface as an error here, exactly as the legacy operator
    /// behaved. The caller reports it and carries on.
    pub async fn forward(&mut self, line: &str) -> Result<Vec<u8>> {
        proto::write_line(&mut self.writer, &format!("{line}\n")).await?;
        let reply = proto::read_frame(&mut self.reader, self.window).await?;
        debug!(bytes = reply.len(), "reply received");
        Ok(reply)
    }

    /// Sends one line without waiting for any reply (the `exit` path).
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        proto::write_line(&mut self.writer, &format!("{line}\n")).await?;
        Ok(())
    }

    /// `download` with an explicit local destination.
    async fn download_to(
        &mut self,
        name: &str,
        dest: &Path,
        progress: impl FnMut(u8),
    ) -> Result<u64> {
        proto::write_line(&mut self.writer, &format!("download {name}")).await?;
        transfer::recv_file(&mut self.reader, dest, self.window, progress).await
    }

    /// `send` with an explicit local source.
    async fn send_from(
        &mut self,
        name: &str,
        source: &Path,
        progress: impl FnMut(u8),
    ) -> Result<u64> {
        proto::write_line(&mut self.writer, &format!("send {name}")).await?;
        transfer::send_file(&mut self.writer, source, progress).await
    }
}
