//! Error types for the [`resolve`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use super::Location;
use derive_more::{Display, Error};

/// A resolver error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a resolver failure.
///
/// ### Initialization Errors
/// - [`ErrorKind::InternalUnavailable`]
/// - [`ErrorKind::Inconsistent`]
/// - [`ErrorKind::Migration`]
/// - [`ErrorKind::Settings`]
///
/// ### Operational Errors
/// - [`ErrorKind::Absent`]
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Export`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The internal store could not be acquired. Nothing can be stored.
    #[display("internal storage is unavailable")]
    InternalUnavailable,
    /// Pictures were recorded as consolidated into an external location that
    /// no longer exists.
    #[display("external storage should be available")]
    Inconsistent,
    /// Copying a picture to the external location failed. Files copied
    /// before the failure stay where they are.
    #[display("failed to migrate pictures")]
    Migration,
    /// A migration flag could not be persisted.
    #[display("failed to persist migration state")]
    Settings,
    /// The requested location is not present.
    #[display("{_0} storage is not available")]
    Absent(#[error(not(source))] Location),
    /// A storage backend operation (list, read, write, delete) failed.
    #[display("storage operation failed")]
    Storage,
    /// Copying a file out of managed storage failed.
    #[display("failed to export file")]
    Export,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Migration | Self::Storage | Self::Export)
    }
}
