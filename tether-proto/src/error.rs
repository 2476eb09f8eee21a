//! Error type for framing and channel reads.

use std::time::Duration;

/// Alias for `Result<T, ProtoError>`.
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Failures on the wire.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProtoError {
    /// No data arrived within the receive window.
    #[error("timed out after {0:?} waiting for the peer")]
    Timeout(Duration),

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,

    /// A frame declared (or a payload had) a length past [`crate::MAX_FRAME`]
    /// or past what a 4-byte prefix can carry.
    #[error("frame of {0} bytes exceeds the frame limit")]
    FrameTooLarge(u64),

    /// An I/O error on the underlying stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProtoError {
    /// True for the receive-window expiry case.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
