//! Chunked file transfer over the channel.
//!
//! A transfer is one 4-byte total-size announcement followed by the raw file
//! bytes in chunks of at most [`proto::CHUNK_SIZE`] bytes, with no per-chunk
//! framing. Either endpoint can sit on either side. Progress is reported to
//! a callback as a truncated percentage after every chunk.

use std::path::Path;
use std::time::Duration;

use tether_proto as proto;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{Error, Result};

/// Streams the file at `path` to the peer.
///
/// A file that cannot be opened is answered with the plain
/// [`proto::reply::NOT_FOUND`] notice in place of the length announcement
/// and reported as [`Error::NotFound`]; the caller's command loop continues.
/// A write failure mid-stream aborts the operation with no retry. The source
/// file is never removed.
///
/// Returns the number of bytes sent.
pub async fn send_file(
    w: &mut (impl AsyncWrite + Unpin),
    path: impl AsRef<Path>,
    mut progress: impl FnMut(u8),
) -> Result<u64> {
    let path = path.as_ref();
    let mut file = match File::open(path).await {
        Ok(f) => f,
        Err(_) => {
            proto::write_line(w, proto::reply::NOT_FOUND).await?;
            return Err(Error::NotFound(path.display().to_string()));
        }
    };

    let total = file.metadata().await?.len();
    let announced =
        u32::try_from(total).map_err(|_| Error::TooLarge(path.display().to_string()))?;
    proto::write_header(w, announced).await?;

    let mut chunk = vec![0u8; proto::CHUNK_SIZE];
    let mut sent: u64 = 0;
    loop {
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        w.write_all(&chunk[..n]).await?;
        sent += n as u64;
        progress(percentage(sent, total));
    }
    w.flush().await?;
    debug!(path = %path.display(), bytes = sent, "file sent");
    Ok(sent)
}

/// Receives a file from the peer into `path`.
///
/// The 4-byte announcement is read first; if that read fails or times out,
/// no file is created. An announced total of zero produces the empty
/// destination without a single data read. Each data read is bounded by
/// `window` and capped at the bytes still owed, so the running total never
/// passes the announced length. Any failure mid-stream deletes the partial
/// destination before returning — a failed transfer leaves nothing on disk.
///
/// Returns the number of bytes received.
pub async fn recv_file(
    r: &mut (impl AsyncRead + Unpin),
    path: impl AsRef<Path>,
    window: Duration,
    mut progress: impl FnMut(u8),
) -> Result<u64> {
    let path = path.as_ref();
    let total = u64::from(proto::read_header(r, window).await?);

    let mut file = File::create(path).await?;
    let result = async {
        let mut chunk = vec![0u8; proto::CHUNK_SIZE];
        let mut received: u64 = 0;
        while received < total {
            #[allow(clippy::cast_possible_truncation)]
            let want = (total - received).min(proto::CHUNK_SIZE as u64) as usize;
            let n = proto::read_chunk(r, &mut chunk[..want], window).await?;
            file.write_all(&chunk[..n]).await?;
            received += n as u64;
            progress(percentage(received, total));
        }
        file.flush().await?;
        Ok::<u64, Error>(received)
    }
    .await;

    match result {
        Ok(received) => {
            debug!(path = %path.display(), bytes = received, "file received");
            Ok(received)
        }
        Err(e) => {
            // No partial file survives a failed transfer. Close the handle
            // first so the unlink also works on Windows.
            drop(file);
            let _ = tokio::fs::remove_file(path).await;
            Err(e)
        }
    }
}

/// Truncated progress percentage. `total` must be non-zero.
#[allow(clippy::cast_possible_truncation)]
fn percentage(done: u64, total: u64) -> u8 {
    ((done * 100) / total) as u8
}
