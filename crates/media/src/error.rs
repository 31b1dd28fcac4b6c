//! Media Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A media error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input bytes could not be decoded. Don't retry with the same input.
    #[display("invalid or corrupted media")]
    Decode,
    /// Decoded media has a zero width or height.
    #[display("media has no pixels")]
    Empty,
    /// Re-encoding the output failed.
    #[display("failed to encode output")]
    Encode,
    /// The codec cannot handle this kind of media.
    #[display("unsupported media: {_0}")]
    Unsupported(#[error(not(source))] String),
    /// The blocking worker running the codec panicked or was cancelled.
    #[display("media worker failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Decode.to_string(), "invalid or corrupted media");
        assert_eq!(ErrorKind::Unsupported("video".to_string()).to_string(), "unsupported media: video");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(!ErrorKind::Decode.is_retryable());
        assert!(!ErrorKind::Unsupported("video".to_string()).is_retryable());
        assert!(ErrorKind::Task.is_retryable());
    }
}
