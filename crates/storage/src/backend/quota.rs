//! Capacity-limited storage backend.
//!
//! This module provides a storage backend implementation that wraps other
//! implementations and rejects writes that would push the total size of all
//! stored files past a fixed quota.

use async_trait::async_trait;

use crate::error::{ErrorKind, Result};
use crate::{BackendHandle, StorageBackend, backend::FileInfoStream, file::FileInfo};

/// Quota-enforcing storage backend.
///
/// Wraps another backend and checks current usage before every
/// [`write`](StorageBackend::write) and [`create`](StorageBackend::create).
/// Usage is recomputed from a listing each time, so files added behind the
/// backend's back are accounted for. Concurrent writers may briefly overshoot
/// the quota by at most one file each.
#[derive(Clone)]
pub struct QuotaBackend {
    inner: BackendHandle,
    quota: u64,
}
impl QuotaBackend {
    pub fn new(inner: BackendHandle, quota: u64) -> Self {
        Self { inner, quota }
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }

    /// Total bytes used by every file in the wrapped backend.
    pub async fn usage(&self) -> Result<u64> {
        Ok(self.inner.list().await?.iter().map(|f| f.size).sum())
    }

    /// Fails with [`QuotaExceeded`](ErrorKind::QuotaExceeded) if replacing
    /// `name` with `requested` bytes would not fit.
    async fn ensure_capacity(&self, name: &str, requested: usize) -> Result<()> {
        let requested = requested as u64;
        // An overwrite frees the space of the file it replaces.
        let used: u64 = self.inner.list().await?.iter().filter(|f| f.name != name).map(|f| f.size).sum();
        if used.saturating_add(requested) > self.quota {
            tracing::warn!(backend = self.inner.name(), name, used, requested, quota = self.quota, "Storage quota exceeded");
            exn::bail!(ErrorKind::QuotaExceeded {
                name: name.to_string(),
                quota: self.quota,
                used,
                requested,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for QuotaBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        self.inner.list_stream()
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        self.inner.exists(name).await
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.inner.read(name).await
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        self.ensure_capacity(name, data.len()).await?;
        self.inner.write(name, data).await
    }

    async fn create(&self, name: &str, data: &[u8]) -> Result<FileInfo> {
        self.ensure_capacity(name, data.len()).await?;
        self.inner.create(name, data).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.inner.delete(name).await
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        self.inner.stat(name).await
    }

    fn native_url(&self, name: &str) -> Option<String> {
        self.inner.native_url(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use std::sync::Arc;

    fn quota_backend(dir: &tempfile::TempDir, quota: u64) -> QuotaBackend {
        let inner = LocalBackend::new("internal", dir.path()).unwrap();
        QuotaBackend::new(Arc::new(inner), quota)
    }

    #[tokio::test]
    async fn test_write_within_quota() {
        let dir = tempfile::tempdir().unwrap();
        let backend = quota_backend(&dir, 10);
        backend.write("a.jpg", b"12345").await.unwrap();
        backend.create("b.jpg", b"12345").await.unwrap();
        assert_eq!(backend.usage().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_write_exceeding_quota() {
        let dir = tempfile::tempdir().unwrap();
        let backend = quota_backend(&dir, 8);
        backend.write("a.jpg", b"12345").await.unwrap();
        let err = backend.create("b.jpg", b"12345").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::QuotaExceeded { used: 5, requested: 5, .. }));
        assert!(!backend.exists("b.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_reuses_space() {
        let dir = tempfile::tempdir().unwrap();
        let backend = quota_backend(&dir, 6);
        backend.write("a.jpg", b"12345").await.unwrap();
        backend.write("a.jpg", b"123456").await.unwrap();
        assert_eq!(backend.read("a.jpg").await.unwrap(), b"123456");
    }

    #[tokio::test]
    async fn test_delete_frees_space() {
        let dir = tempfile::tempdir().unwrap();
        let backend = quota_backend(&dir, 5);
        backend.write("a.jpg", b"12345").await.unwrap();
        assert!(backend.write("b.jpg", b"1").await.is_err());
        backend.delete("a.jpg").await.unwrap();
        backend.write("b.jpg", b"1").await.unwrap();
    }
}
