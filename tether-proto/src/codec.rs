//! Length-prefixed framing and bounded-timeout reads over any async stream.
//!
//! Each frame is `[u32 big-endian length][payload]`. The same bare header,
//! written without a payload following immediately, announces a file's total
//! size at the start of a transfer.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::{ProtoError, Result};
use crate::{CHUNK_SIZE, MAX_FRAME};

/// Writes a 4-byte big-endian length prefix followed by `payload`, then
/// flushes.
pub async fn write_frame(w: &mut (impl AsyncWrite + Unpin), payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtoError::FrameTooLarge(payload.len() as u64))?;
    write_header(w, len).await?;
    w.write_all(payload).await?;
    w.flush().await?;
    Ok(())
}

/// Writes the bare 4-byte length header.
///
/// Used both as a frame prefix and as the total-size announcement at the
/// start of a file transfer.
pub async fn write_header(w: &mut (impl AsyncWrite + Unpin), len: u32) -> Result<()> {
    w.write_all(&len.to_be_bytes()).await?;
    Ok(())
}

/// Reads the 4-byte length header, waiting at most `window` for it.
///
/// A clean EOF is [`ProtoError::Closed`]; a stall is [`ProtoError::Timeout`].
pub async fn read_header(r: &mut (impl AsyncRead + Unpin), window: Duration) -> Result<u32> {
    let mut buf = [0u8; 4];
    match timeout(window, r.read_exact(&mut buf)).await {
        Ok(Ok(_)) => Ok(u32::from_be_bytes(buf)),
        Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ProtoError::Closed),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ProtoError::Timeout(window)),
    }
}

/// One bounded read into `buf`.
///
/// Returns between 1 and `buf.len()` bytes, whatever the stream delivers
/// first; [`ProtoError::Closed`] on EOF; [`ProtoError::Timeout`] when
/// nothing arrives within `window`. Callers needing an exact count loop.
pub async fn read_chunk(
    r: &mut (impl AsyncRead + Unpin),
    buf: &mut [u8],
    window: Duration,
) -> Result<usize> {
    match timeout(window, r.read(buf)).await {
        Ok(Ok(0)) => Err(ProtoError::Closed),
        Ok(Ok(n)) => Ok(n),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ProtoError::Timeout(window)),
    }
}

/// Reads one complete frame: the header, then exactly that many payload
/// bytes.
///
/// The payload is drained with repeated bounded reads; a stall past `window`
/// mid-payload is a [`ProtoError::Timeout`], never a short success. Frames
/// past [`MAX_FRAME`] are rejected before any payload is read.
pub async fn read_frame(r: &mut (impl AsyncRead + Unpin), window: Duration) -> Result<Vec<u8>> {
    let len = read_header(r, window).await?;
    if len > MAX_FRAME {
        return Err(ProtoError::FrameTooLarge(u64::from(len)));
    }
    let mut payload = vec![0u8; len as usize];
    let mut filled = 0;
    while filled < payload.len() {
        filled += read_chunk(r, &mut payload[filled..], window).await?;
    }
    Ok(payload)
}

/// Reads one command line: a single read of at most [`CHUNK_SIZE`] bytes.
///
/// Blocks without a timeout — an idle peer between commands is not an error.
/// Returns [`ProtoError::Closed`] when the peer disconnects.
pub async fn read_line(r: &mut (impl AsyncRead + Unpin)) -> Result<String> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let n = r.read(&mut buf).await?;
    if n == 0 {
        return Err(ProtoError::Closed);
    }
    buf.truncate(n);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes text verbatim (no framing, no added terminator) and flushes.
pub async fn write_line(w: &mut (impl AsyncWrite + Unpin), line: &str) -> Result<()> {
    w.write_all(line.as_bytes()).await?;
    w.flush().await?;
    Ok(())
}
