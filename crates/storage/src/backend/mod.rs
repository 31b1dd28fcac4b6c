//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface over a flat, directory-like store of named files (the internal
//! sandbox, a user-visible volume, or an in-memory map for tests).
//!

mod local;
#[cfg(feature = "mock")]
mod mock;
mod quota;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
pub use self::quota::QuotaBackend;
use crate::error::Result;
use crate::file::FileInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// All storage operations are asynchronous. Locations are flat: every name
/// addresses a file directly under the backend's root, and there is no
/// rename primitive (a rename is a [`create`](Self::create) followed by a
/// [`delete`](Self::delete)).
///
/// # Names
/// All names must be validated using [`validate_name`](crate::validate_name)
/// before use. Implementations should enforce this validation.
///
/// # Examples
///
/// ```
/// use shutter_storage::{backend::StorageBackend, error::Result};
///
/// async fn size_of_hardcoded_file(backend: &dyn StorageBackend) -> Result<u64> {
///     let name = "IMG_20240101_120000.jpg";
///     if backend.exists(name).await? {
///         let data = backend.read(name).await?;
///         Ok(data.len() as u64)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// List all files directly under the backend root.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self) -> Result<Vec<FileInfo>> {
        self.list_stream().try_collect().await
    }

    /// Stream file metadata for every file directly under the backend root.
    ///
    /// Sub-directories, broken links and names that are not valid UTF-8 are
    /// skipped. Order is unspecified.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use shutter_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream();
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.name, info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream(&self) -> FileInfoStream<'_>;

    /// Check if a file exists.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file with the provided data.
    ///
    /// ```no_run
    /// # use shutter_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// backend.write("IMG_20240101_120000.jpg", b"\xFF\xD8\xFF").await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Exclusively create a new file with the provided data.
    ///
    /// Returns [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if a
    /// file with the same name is already present; the existing file is left
    /// untouched. This is the primitive collision avoidance is built on, so
    /// the check and the creation must be atomic with respect to other
    /// callers of the same backend.
    async fn create(&self, name: &str, data: &[u8]) -> Result<FileInfo>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Get file metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn stat(&self, name: &str) -> Result<FileInfo>;

    /// A URL addressing the file in place, if the backend has one.
    ///
    /// Backends without a location-native URL (in-memory stores, for
    /// example) return `None`, and callers fall back to building a URL from
    /// the file's content.
    fn native_url(&self, _name: &str) -> Option<String> {
        None
    }
}
