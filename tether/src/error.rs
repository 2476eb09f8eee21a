//! Error types for tether operations.

use tether_proto::ProtoError;

/// Alias for `Result<T, tether::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by transfer, session, and client operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The named local file could not be opened for sending.
    ///
    /// The plain-text notice has already gone out on the wire when this is
    /// returned; the command loop continues.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The file's size does not fit the 4-byte length announcement.
    #[error("{0}: file exceeds the 4 GiB transfer limit")]
    TooLarge(String),

    /// A wire-level failure: timeout, closed channel, or bad framing.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// A local I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when a bounded receive expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Proto(e) if e.is_timeout())
    }
}
