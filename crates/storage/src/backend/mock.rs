//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::path::validate as validate_name;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use time::UtcDateTime;
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Ideal for unit
/// tests that need a [`StorageBackend`] without filesystem dependencies.
///
/// Individual names can be made to fail on write with
/// [`fail_writes_to`](Self::fail_writes_to), to exercise error paths.
///
/// # Examples
///
/// ```
/// use shutter_storage::backend::{MockBackend, StorageBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("IMG_20240101_120000.jpg", b"jpeg"),
/// ]);
/// assert!(backend.exists("IMG_20240101_120000.jpg").await?);
///
/// backend.write("VID_20240101_120000.mkv", b"data...").await?;
/// assert!(backend.exists("VID_20240101_120000.mkv").await?);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<String, (UtcDateTime, Vec<u8>)>>,
    failing: RwLock<HashSet<String>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any name fails validation. If test setup is wrong, then
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        let now = UtcDateTime::now();
        for (name, data) in files {
            let name = name.into();
            if validate_name(&name).is_err() {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid name {name}");
            }
            map.insert(name, (now, data.into()));
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every subsequent write or create of `name` fail with a
    /// [`BackendError`](ErrorKind::BackendError).
    pub async fn fail_writes_to(&self, name: impl Into<String>) {
        self.failing.write().await.insert(name.into());
    }

    /// Sorted snapshot of every stored name.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.storage.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn check_failure(&self, name: &str) -> Result<()> {
        if self.failing.read().await.contains(name) {
            exn::bail!(ErrorKind::BackendError(format!("injected write failure for {name}")));
        }
        Ok(())
    }

    fn file_info(name: &str, size: u64, inserted: UtcDateTime) -> FileInfo {
        FileInfo::new(name, size, inserted)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        Box::pin(stream! {
            // Snapshot entries under the read lock, then drop it before
            // yielding to avoid holding the lock across yield points.
            let entries: Vec<(String, UtcDateTime, u64)> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .map(|(name, (inserted, data))| (name.clone(), *inserted, data.len() as u64))
                    .collect()
            };
            for (name, inserted, size) in entries {
                yield Ok(Self::file_info(&name, size, inserted));
            }
        })
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let name = validate_name(name)?;
        Ok(self.storage.read().await.contains_key(name))
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let name = validate_name(name)?;
        let (_inserted, data) = self
            .storage
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(name.to_string())))?;
        Ok(data)
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let name = validate_name(name)?;
        self.check_failure(name).await?;
        self.storage.write().await.insert(name.to_string(), (UtcDateTime::now(), data.to_vec()));
        Ok(())
    }

    async fn create(&self, name: &str, data: &[u8]) -> Result<FileInfo> {
        let name = validate_name(name)?;
        self.check_failure(name).await?;
        let mut guard = self.storage.write().await;
        if guard.contains_key(name) {
            exn::bail!(ErrorKind::AlreadyExists(name.to_string()));
        }
        let now = UtcDateTime::now();
        guard.insert(name.to_string(), (now, data.to_vec()));
        Ok(Self::file_info(name, data.len() as u64, now))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        self.storage
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(name.to_string())))
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let name = validate_name(name)?;
        let guard = self.storage.read().await;
        let (inserted, data) =
            guard.get(name).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(name.to_string())))?;
        Ok(Self::file_info(name, data.len() as u64, *inserted))
    }
}
