//! Wire protocol for the tether operator↔listener channel.
//!
//! Command lines travel as unframed newline-terminated text. Generic replies
//! and captured shell output travel as `[u32 big-endian length][raw bytes]`
//! frames. A file transfer starts with the same bare 4-byte length header
//! (the file's total size) followed by the raw bytes in chunks of at most
//! [`CHUNK_SIZE`]. Suitable for any reliable, ordered byte stream.
//!
//! Every receive except command receipt is bounded by a timeout window so an
//! unresponsive peer becomes a recoverable local failure instead of a hang.

mod codec;
mod command;
mod error;
pub mod reply;

pub use codec::{
    read_chunk, read_frame, read_header, read_line, write_frame, write_header, write_line,
};
pub use command::Command;
pub use error::{ProtoError, Result};

use std::time::Duration;

/// Default TCP port the listener binds.
pub const DEFAULT_PORT: u16 = 8080;

/// Fixed buffer size: maximum command line length and file chunk size.
pub const CHUNK_SIZE: usize = 4096;

/// Default window for every bounded receive.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum buffered reply frame (16 MiB).
///
/// Bounds memory on the frame-draining path. File transfers stream chunk by
/// chunk and are not subject to this cap.
pub const MAX_FRAME: u32 = 16 * 1024 * 1024;
