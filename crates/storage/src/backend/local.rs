//! Local filesystem storage backend.
//!
//! This module provides a storage backend implementation for a single local
//! directory. Files are accessed using `tokio::fs` for async I/O.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_name};
use async_stream::stream;
use async_trait::async_trait;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry, OpenOptions};
use tokio::io::AsyncWriteExt;
use url::Url;

/// Local filesystem storage backend.
///
/// Stores files directly inside a directory on the local filesystem. All
/// names are relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use shutter_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("internal", "/var/lib/shutter/internal")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Directory holding the files
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend, creating the directory if it
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists and is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidName(root.display().to_string()));
        }

        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidName(root.display().to_string()));
            }
        } else {
            // Use non-async here; it'll only happen once on initialization
            // and it's not worth the hassle of making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root.display().to_string()))?;
        }

        Ok(Self { name: name.into(), root })
    }

    /// Open an existing directory without creating it.
    ///
    /// Returns `Ok(None)` when the directory does not exist, which is how
    /// hosts report an absent volume sub-directory.
    pub fn open(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Option<Self>> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Ok(None);
        }
        Self::new(name, root).map(Some)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a file name.
    fn absolute_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_name(name)?))
    }

    fn metadata(name: String, metadata: &Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?;
        Ok(FileInfo::new(name, metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, name: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(name.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(name.to_string()),
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists(name.to_string()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Keeps the `?` operator usable for a single directory entry; the
    /// stream loop itself can only yield.
    async fn process_entry(&self, entry: DirEntry) -> Result<Option<FileInfo>> {
        let Ok(name) = entry.file_name().into_string() else {
            tracing::debug!(backend = %self.name, path = %entry.path().display(), "Skipping non UTF-8 file name");
            return Ok(None);
        };
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &name))?;
        if !metadata.is_file() {
            // Sub-directories and what is most likely a broken symlink.
            return Ok(None);
        }
        Self::metadata(name, &metadata).map(Some)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        Box::pin(stream! {
            let mut entries = match fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                // Asking for the contents of a directory that has since been
                // removed results in an empty list, not an error.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
                Err(err) => {
                    yield Err(exn::Exn::from(Self::map_io_error(err, &self.root.display().to_string())));
                    return;
                }
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(exn::Exn::from(Self::map_io_error(e, &self.root.display().to_string())));
                        continue;
                    },
                };
                match self.process_entry(entry).await {
                    Ok(Some(file)) => yield Ok(file),
                    Ok(None) => {},
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?)
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, name))?)
    }

    async fn create(&self, name: &str, data: &[u8]) -> Result<FileInfo> {
        let abs_path = self.absolute_path(name)?;
        // `create_new` is atomic at the filesystem level: exactly one of any
        // number of racing creators wins the name.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&abs_path)
            .await
            .map_err(|e| Self::map_io_error(e, name))?;
        file.write_all(data).await.map_err(|e| Self::map_io_error(e, name))?;
        file.flush().await.map_err(|e| Self::map_io_error(e, name))?;
        let metadata = file.metadata().await.map_err(|e| Self::map_io_error(e, name))?;
        Self::metadata(name.to_string(), &metadata)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?)
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let abs_path = self.absolute_path(name)?;
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?;
        if !metadata.is_file() {
            exn::bail!(ErrorKind::NotFound(name.to_string()));
        }
        Self::metadata(name.to_string(), &metadata)
    }

    fn native_url(&self, name: &str) -> Option<String> {
        let abs_path = self.absolute_path(name).ok()?;
        Url::from_file_path(abs_path).ok().map(String::from)
    }
}
