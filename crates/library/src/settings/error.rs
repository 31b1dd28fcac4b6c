//! Error types for the [`settings`](super) module.

use derive_more::{Display, Error};

/// A settings error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The backing store could not be read.
    #[display("failed to read settings")]
    Read,
    /// The backing store could not be written.
    #[display("failed to write settings")]
    Write,
    /// The stored settings are not a JSON object.
    #[display("settings are malformed")]
    Format,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }
}
