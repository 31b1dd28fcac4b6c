//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist
    #[display("file not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied (permissions or sandbox restrictions)
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// File already exists (for operations that require new files)
    #[display("file already exists: {_0}")]
    AlreadyExists(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// File name is empty, contains a separator, or otherwise escapes the
    /// storage directory
    #[display("invalid file name: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// Writing the file would exceed the storage quota
    #[display("quota of {quota} bytes exceeded writing {name} ({requested} bytes requested, {used} bytes used)")]
    QuotaExceeded {
        name: String,
        quota: u64,
        used: u64,
        requested: u64,
    },
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BackendError(_))
    }

    /// Returns `true` for [`NotFound`](Self::NotFound), the one failure most
    /// callers want to treat as "absent" instead of as an error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
