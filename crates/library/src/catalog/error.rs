//! Error types for the [`catalog`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Listing, reading, writing or deleting a picture failed.
    #[display("storage operation failed")]
    Storage,
    /// A thumbnail could not be produced.
    #[display("failed to generate thumbnail")]
    Media,
    /// The catalog failed to load earlier. It is not retried; every
    /// operation fails the same way until the catalog is rebuilt.
    #[display("picture catalog failed to load")]
    LoadFailed,
    /// Copying a picture out of managed storage failed.
    #[display("failed to export picture")]
    Export,
    /// A detached catalog task panicked or was cancelled.
    #[display("catalog task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Export)
    }
}
