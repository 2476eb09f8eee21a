//! Listener-side session: one connection, commands resolved strictly in
//! order.
//!
//! A session owns the channel halves, the receive window, and a
//! session-local working directory. The legacy design changed the process
//! directory and kept handles in globals; here everything a handler touches
//! is a field or a local, and file/process handles are released on every
//! exit path.

use std::path::PathBuf;
use std::time::Duration;

use tether_proto::{self as proto, Command, ProtoError};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, trace, warn};

use crate::error::{Error, Result};
use crate::{exec, transfer};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer sent `terminate`: the listener should stop serving.
    Terminated,
    /// The peer disconnected, or the connection became unusable.
    Disconnected,
}

/// Per-connection state for the listener endpoint.
#[derive(Debug)]
pub struct Session<R, W> {
    /// Read half of the channel.
    reader: R,
    /// Write half of the channel.
    writer: W,
    /// Window applied to every bounded receive.
    window: Duration,
    /// Directory that paths and shell commands resolve against.
    cwd: PathBuf,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a session rooted at the process working directory.
    pub fn new(reader: R, writer: W, window: Duration) -> std::io::Result<Self> {
        Ok(Self::rooted(reader, writer, window, std::env::current_dir()?))
    }

    /// Creates a session rooted at an explicit directory.
    pub fn rooted(reader: R, writer: W, window: Duration, cwd: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            writer,
            window,
            cwd: cwd.into(),
        }
    }

    /// Runs the command loop until the peer disconnects or terminates.
    ///
    /// Operation-level failures (a timeout mid-transfer, a missing file, a
    /// failed `cd`) are answered and the loop continues; only a dead channel
    /// or `terminate` ends it.
    pub async fn run(&mut self) -> Result<SessionEnd> {
        loop {
            let line = match proto::read_line(&mut self.reader).await {
                Ok(line) => line,
                Err(ProtoError::Closed) => return Ok(SessionEnd::Disconnected),
                Err(e) => return Err(e.into()),
            };
            trace!(command = line.trim_end(), "received");

            match Command::parse(&line) {
                Command::Terminate => {
                    info!("terminate received");
                    return Ok(SessionEnd::Terminated);
                }
                Command::Cd(path) => self.change_dir(&path).await?,
                Command::Download(name) => self.send_to_peer(&name).await?,
                Command::Send(name) => self.recv_from_peer(&name).await?,
                Command::Remove(name) => self.remove(&name).await?,
                Command::Shell(cmd) => {
                    if !self.shell(&cmd).await? {
                        return Ok(SessionEnd::Disconnected);
                    }
                }
            }
        }
    }

    /// Applies `cd` and replies with a plain text line either way.
    ///
    /// A leading `~` stands for the invoking user's home directory; anything
    /// else resolves against the session working directory.
    async fn change_dir(&mut self, path: &str) -> Result<()> {
        match self.resolve_dir(path) {
            Some(dir) => {
                trace!(dir = %dir.display(), "directory changed");
                self.cwd = dir;
                proto::write_line(&mut self.writer, proto::reply::CD_OK).await?;
            }
            None => {
                warn!(path, "cd failed");
                proto::write_line(&mut self.writer, proto::reply::CD_FAILED).await?;
            }
        }
        Ok(())
    }

    /// Expands the home placeholder, joins against the session cwd, and
    /// canonicalizes. `None` when the result is not an existing directory.
    fn resolve_dir(&self, path: &str) -> Option<PathBuf> {
        let joined = if let Some(rest) = path.strip_prefix('~') {
            dirs::home_dir()?.join(rest.trim_start_matches(['/', '\\']))
        } else {
            self.cwd.join(path)
        };
        match joined.canonicalize() {
            Ok(dir) if dir.is_dir() => Some(dir),
            _ => None,
        }
    }

    /// Resolves a file argument against the session working directory.
    fn resolve(&self, name: &str) -> PathBuf {
        self.cwd.join(name)
    }

    /// `download`: this side streams the named file to the peer.
    async fn send_to_peer(&mut self, name: &str) -> Result<()> {
        let path = self.resolve(name);
        match transfer::send_file(&mut self.writer, &path, |pct| trace!(pct, "sending")).await {
            Ok(bytes) => info!(file = name, bytes, "file sent"),
            Err(e @ (Error::NotFound(_) | Error::TooLarge(_))) => {
                warn!(file = name, error = %e, "download refused");
            }
            Err(e) => warn!(file = name, error = %e, "send aborted"),
        }
        Ok(())
    }

    /// `send`: this side receives the named file from the peer.
    async fn recv_from_peer(&mut self, name: &str) -> Result<()> {
        let path = self.resolve(name);
        match transfer::recv_file(&mut self.reader, &path, self.window, |pct| {
            trace!(pct, "receiving");
        })
        .await
        {
            Ok(bytes) => info!(file = name, bytes, "file received"),
            Err(e) => warn!(file = name, error = %e, "receive aborted"),
        }
        Ok(())
    }

    /// `remove`: deletes the named file and reports the outcome.
    async fn remove(&mut self, name: &str) -> Result<()> {
        let path = self.resolve(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(file = name, "file removed");
                proto::write_line(&mut self.writer, proto::reply::REMOVE_OK).await?;
            }
            Err(e) => {
                warn!(file = name, error = %e, "remove failed");
                proto::write_line(&mut self.writer, proto::reply::REMOVE_FAILED).await?;
            }
        }
        Ok(())
    }

    /// Runs a generic line through the shell bridge and frames the reply.
    ///
    /// Returns `false` when the shell itself could not be spawned; the
    /// session ends after the plain failure notice, matching the legacy
    /// listener.
    async fn shell(&mut self, line: &str) -> Result<bool> {
        let output = match exec::run(line, &self.cwd).await {
            Ok(out) => out,
            Err(e) => {
                warn!(command = line, error = %e, "shell spawn failed");
                proto::write_line(&mut self.writer, proto::reply::EXEC_FAILED).await?;
                return Ok(false);
            }
        };

        if !output.success {
            proto::write_line(&mut self.writer, proto::reply::EXEC_ERROR).await?;
        } else if output.stdout.is_empty() {
            proto::write_frame(&mut self.writer, proto::reply::EXEC_COMPLETE.as_bytes()).await?;
        } else {
            proto::write_frame(&mut self.writer, &output.stdout).await?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex, split};

    use super::*;
    use tether_proto::READ_TIMEOUT;

    /// Spins up a session over an in-memory duplex rooted at `cwd`, returning
    /// the operator-side stream and the running session future.
    fn harness(
        cwd: &std::path::Path,
        window: Duration,
    ) -> (
        tokio::io::DuplexStream,
        impl Future<Output = Result<SessionEnd>>,
    ) {
        let (op, agent) = duplex(256);
        let (ar, aw) = split(agent);
        let mut session = Session::rooted(ar, aw, window, cwd);
        let fut = async move { session.run().await };
        (op, fut)
    }

    /// Reads one exact plain-text reply off the operator stream.
    async fn read_plain(op: &mut tokio::io::DuplexStream, expect: &str) {
        let mut buf = vec![0u8; expect.len()];
        op.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, expect.as_bytes());
    }

    #[tokio::test]
    async fn terminate_ends_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let (mut op, session) = harness(dir.path(), READ_TIMEOUT);

        op.write_all(b"terminate\n").await.unwrap();
        let end = session.await.unwrap();
        assert_eq!(end, SessionEnd::Terminated);
    }

    #[tokio::test]
    async fn disconnect_ends_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let (op, session) = harness(dir.path(), READ_TIMEOUT);

        drop(op);
        let end = session.await.unwrap();
        assert_eq!(end, SessionEnd::Disconnected);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cd_and_remove_reply_without_a_length_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/junk"), b"x").unwrap();
        let (mut op, session) = harness(dir.path(), READ_TIMEOUT);

        let driver = async {
            op.write_all(b"cd sub\n").await.unwrap();
            read_plain(&mut op, proto::reply::CD_OK).await;

            op.write_all(b"cd nowhere\n").await.unwrap();
            read_plain(&mut op, proto::reply::CD_FAILED).await;

            // Relative to the new cwd after the successful cd.
            op.write_all(b"remove junk\n").await.unwrap();
            read_plain(&mut op, proto::reply::REMOVE_OK).await;

            op.write_all(b"remove junk\n").await.unwrap();
            read_plain(&mut op, proto::reply::REMOVE_FAILED).await;

            drop(op);
        };
        let (end, ()) = tokio::join!(session, driver);
        assert_eq!(end.unwrap(), SessionEnd::Disconnected);
        assert!(!dir.path().join("sub/junk").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_output_is_framed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut op, session) = harness(dir.path(), READ_TIMEOUT);

        let driver = async {
            op.write_all(b"echo hi\n").await.unwrap();
            let reply = proto::read_frame(&mut op, READ_TIMEOUT).await.unwrap();
            assert_eq!(reply, b"hi\n");

            // Success with empty output substitutes the framed completion line.
            op.write_all(b"true\n").await.unwrap();
            let reply = proto::read_frame(&mut op, READ_TIMEOUT).await.unwrap();
            assert_eq!(reply, proto::reply::EXEC_COMPLETE.as_bytes());

            // Non-zero exit is a plain unframed line.
            op.write_all(b"false\n").await.unwrap();
            read_plain(&mut op, proto::reply::EXEC_ERROR).await;

            drop(op);
        };
        let (end, ()) = tokio::join!(session, driver);
        assert_eq!(end.unwrap(), SessionEnd::Disconnected);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn download_streams_the_named_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.bin"), b"payload bytes").unwrap();
        let (mut op, session) = harness(dir.path(), READ_TIMEOUT);

        let driver = async {
            op.write_all(b"download data.bin").await.unwrap();
            let total = proto::read_header(&mut op, READ_TIMEOUT).await.unwrap();
            assert_eq!(total, 13);
            let mut body = vec![0u8; 13];
            op.read_exact(&mut body).await.unwrap();
            assert_eq!(body, b"payload bytes");

            drop(op);
        };
        let (end, ()) = tokio::join!(session, driver);
        assert_eq!(end.unwrap(), SessionEnd::Disconnected);
    }

    #[tokio::test]
    async fn download_of_missing_file_answers_plain_notice() {
        let dir = tempfile::tempdir().unwrap();
        let (mut op, session) = harness(dir.path(), READ_TIMEOUT);

        let driver = async {
            op.write_all(b"download ghost.bin").await.unwrap();
            read_plain(&mut op, proto::reply::NOT_FOUND).await;
            drop(op);
        };
        let (end, ()) = tokio::join!(session, driver);
        assert_eq!(end.unwrap(), SessionEnd::Disconnected);
    }

    #[tokio::test]
    async fn push_writes_file_relative_to_session_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let (mut op, session) = harness(dir.path(), READ_TIMEOUT);

        let driver = async {
            // Command line and transfer payload travel on the same unframed
            // stream; yield so the line lands in its own read before the
            // announcement follows. The data reads themselves are capped at
            // the announced total, so nothing after them can be swallowed.
            op.write_all(b"send incoming.bin").await.unwrap();
            tokio::task::yield_now().await;
            tether_proto::write_header(&mut op, 5).await.unwrap();
            op.write_all(b"12345").await.unwrap();
            op.write_all(b"terminate\n").await.unwrap();
        };
        let (end, ()) = tokio::join!(session, driver);
        assert_eq!(end.unwrap(), SessionEnd::Terminated);
        assert_eq!(
            std::fs::read(dir.path().join("incoming.bin")).unwrap(),
            b"12345"
        );
    }

    #[tokio::test]
    async fn files_round_trip_through_a_live_session() {
        let op_dir = tempfile::tempdir().unwrap();
        let agent_dir = tempfile::tempdir().unwrap();
        let original: Vec<u8> = (0..150_000u32).map(|i| (i % 241) as u8).collect();
        let src = op_dir.path().join("blob.bin");
        let back = op_dir.path().join("back.bin");
        std::fs::write(&src, &original).unwrap();
        let len = original.len() as u64;

        // Roomy buffer: the operator's writes never stall mid-line, so each
        // command line lands in the stream in one piece.
        let (mut op, agent) = duplex(1 << 20);
        let (ar, aw) = split(agent);
        let mut session = Session::rooted(ar, aw, READ_TIMEOUT, agent_dir.path());
        let session = async move { session.run().await };

        let driver = async {
            // Push the file up, then pull it back down over the same session.
            tether_proto::write_line(&mut op, "send blob.bin").await.unwrap();
            tokio::task::yield_now().await;
            let pushed = transfer::send_file(&mut op, &src, |_| {}).await.unwrap();
            assert_eq!(pushed, len);

            tether_proto::write_line(&mut op, "download blob.bin").await.unwrap();
            let pulled = transfer::recv_file(&mut op, &back, READ_TIMEOUT, |_| {})
                .await
                .unwrap();
            assert_eq!(pulled, len);

            drop(op);
        };
        let (end, ()) = tokio::join!(session, driver);
        assert_eq!(end.unwrap(), SessionEnd::Disconnected);

        assert_eq!(
            std::fs::read(agent_dir.path().join("blob.bin")).unwrap(),
            original
        );
        assert_eq!(std::fs::read(op_dir.path().join("back.bin")).unwrap(), original);
    }

    #[tokio::test]
    async fn aborted_push_leaves_no_partial_file_and_session_continues() {
        let dir = tempfile::tempdir().unwrap();
        let window = Duration::from_millis(150);
        let (mut op, session) = harness(dir.path(), window);

        let driver = async {
            op.write_all(b"send torn.bin").await.unwrap();
            tokio::task::yield_now().await;
            tether_proto::write_header(&mut op, 100).await.unwrap();
            op.write_all(b"only this much").await.unwrap();
            // Stall past the receive window: the partial file is removed and
            // the session is still answering commands afterwards.
            tokio::time::sleep(window * 3).await;
            op.write_all(b"terminate\n").await.unwrap();
        };
        let (end, ()) = tokio::join!(session, driver);
        assert_eq!(end.unwrap(), SessionEnd::Terminated);
        assert!(!dir.path().join("torn.bin").exists());
    }
}
