//! File metadata returned by storage backends for listing, stat and create
//! operations.

use time::OffsetDateTime;

/// File metadata returned by storage backends.
///
/// Names are relative to the (flat) storage location and unique within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// File name within the storage location
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64, modified: impl Into<OffsetDateTime>) -> Self {
        Self {
            name: name.into(),
            size,
            modified: modified.into(),
        }
    }
}
