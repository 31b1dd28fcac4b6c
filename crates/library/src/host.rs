//! Host platform integration.
//!
//! The host decides where the internal store lives and which user-visible
//! volumes exist. [`probe_external`] picks the volume pictures are kept on.

use async_trait::async_trait;
use shutter_config::Config;
use shutter_storage::backend::{LocalBackend, QuotaBackend};
use shutter_storage::error::Result as StorageResult;
use shutter_storage::BackendHandle;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Volume identifiers (substrings) that can hold the external location, in
/// order of preference within the volume list.
pub const EXTERNAL_VOLUME_PATTERNS: [&str; 2] = ["downloads:Downloads", "downloads:MyFiles"];
const MY_FILES_PATTERN: &str = "downloads:MyFiles";
const DOWNLOADS_DIRECTORY: &str = "Downloads";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Volume {
    pub id: String,
}
impl Volume {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Acquire (creating if needed) the sandboxed store, limited to `quota`
    /// bytes.
    async fn internal_store(&self, quota: u64) -> StorageResult<BackendHandle>;

    /// Volumes currently exposed. `None` when the host has no volume
    /// integration at all.
    async fn volumes(&self) -> Option<Vec<Volume>>;

    /// Open a volume, or a sub-directory of it. `Ok(None)` when the
    /// requested directory does not exist.
    async fn open_volume(&self, volume: &Volume, subdirectory: Option<&str>) -> StorageResult<Option<BackendHandle>>;
}

/// Locate the external location, if the host exposes one.
///
/// The first volume whose id contains one of [`EXTERNAL_VOLUME_PATTERNS`]
/// wins. On a `downloads:MyFiles` volume pictures go to its `Downloads`
/// sub-directory, and the location is absent if that does not exist. Errors
/// opening the volume are logged and treated as "absent".
pub async fn probe_external(host: &dyn Host) -> Option<BackendHandle> {
    let volumes = host.volumes().await?;
    let volume = volumes
        .iter()
        .find(|volume| EXTERNAL_VOLUME_PATTERNS.iter().any(|pattern| volume.id.contains(pattern)))?;
    let subdirectory = volume.id.contains(MY_FILES_PATTERN).then_some(DOWNLOADS_DIRECTORY);
    match host.open_volume(volume, subdirectory).await {
        Ok(Some(backend)) => {
            tracing::debug!(volume = %volume.id, ?subdirectory, "External location found");
            Some(backend)
        },
        Ok(None) => {
            tracing::info!(volume = %volume.id, ?subdirectory, "External directory does not exist");
            None
        },
        Err(e) => {
            tracing::warn!(volume = %volume.id, error = ?e, "Failed to open external volume");
            None
        },
    }
}

/// A host made of local directories, as declared in the configuration.
pub struct LocalHost {
    internal: PathBuf,
    volumes: Vec<Volume>,
    roots: HashMap<Volume, PathBuf>,
}

impl LocalHost {
    pub fn new(internal: impl Into<PathBuf>, volumes: impl IntoIterator<Item = (Volume, PathBuf)>) -> Self {
        let mut order = Vec::new();
        let mut roots = HashMap::new();
        for (volume, root) in volumes {
            order.push(volume.clone());
            roots.insert(volume, root);
        }
        Self {
            internal: internal.into(),
            volumes: order,
            roots,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.internal.path,
            config.volumes.iter().map(|v| (Volume::new(&v.id), v.path.clone())),
        )
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn internal_store(&self, quota: u64) -> StorageResult<BackendHandle> {
        let local = LocalBackend::new("internal", &self.internal)?;
        Ok(Arc::new(QuotaBackend::new(Arc::new(local), quota)))
    }

    async fn volumes(&self) -> Option<Vec<Volume>> {
        Some(self.volumes.clone())
    }

    async fn open_volume(&self, volume: &Volume, subdirectory: Option<&str>) -> StorageResult<Option<BackendHandle>> {
        let Some(root) = self.roots.get(volume) else {
            return Ok(None);
        };
        let root = match subdirectory {
            Some(subdirectory) => root.join(subdirectory),
            None => root.clone(),
        };
        let backend = LocalBackend::open(volume.id.clone(), root)?;
        Ok(backend.map(|b| Arc::new(b) as BackendHandle))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use shutter_storage::error::ErrorKind as StorageErrorKind;

    /// Host handing out preconstructed backends.
    #[derive(Default)]
    pub(crate) struct StaticHost {
        /// `None` makes [`Host::internal_store`] fail.
        pub internal: Option<BackendHandle>,
        pub external: Option<BackendHandle>,
    }

    #[async_trait]
    impl Host for StaticHost {
        async fn internal_store(&self, _quota: u64) -> StorageResult<BackendHandle> {
            match &self.internal {
                Some(backend) => Ok(backend.clone()),
                None => exn::bail!(StorageErrorKind::PermissionDenied("internal".to_string())),
            }
        }

        async fn volumes(&self) -> Option<Vec<Volume>> {
            Some(vec![Volume::new("downloads:Downloads")])
        }

        async fn open_volume(&self, _: &Volume, _: Option<&str>) -> StorageResult<Option<BackendHandle>> {
            Ok(self.external.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn host_with(dir: &TempDir, volumes: &[(&str, &str)]) -> LocalHost {
        LocalHost::new(
            dir.path().join("internal"),
            volumes.iter().map(|(id, path)| (Volume::new(*id), dir.path().join(path))),
        )
    }

    #[tokio::test]
    async fn test_internal_store_is_created() {
        let dir = TempDir::new().unwrap();
        let host = host_with(&dir, &[]);
        let internal = host.internal_store(1024).await.unwrap();
        internal.write("IMG_1.jpg", b"data").await.unwrap();
        assert!(dir.path().join("internal").join("IMG_1.jpg").is_file());
    }

    #[tokio::test]
    async fn test_internal_store_enforces_quota() {
        let dir = TempDir::new().unwrap();
        let internal = host_with(&dir, &[]).internal_store(4).await.unwrap();
        assert!(internal.write("IMG_1.jpg", b"too large").await.is_err());
    }

    #[tokio::test]
    async fn test_no_volumes_means_no_external() {
        let dir = TempDir::new().unwrap();
        assert!(probe_external(&host_with(&dir, &[])).await.is_none());
    }

    #[rstest]
    #[case("downloads:Downloads")]
    #[case("removable:downloads:Downloads:1")]
    #[tokio::test]
    async fn test_downloads_volume_used_directly(#[case] id: &str) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("dl")).unwrap();
        let host = host_with(&dir, &[("removable:usb", "usb"), (id, "dl")]);
        let external = probe_external(&host).await.unwrap();
        external.write("IMG_1.jpg", b"data").await.unwrap();
        assert!(dir.path().join("dl").join("IMG_1.jpg").is_file());
    }

    #[tokio::test]
    async fn test_my_files_uses_downloads_subdirectory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("MyFiles").join("Downloads")).unwrap();
        let host = host_with(&dir, &[("downloads:MyFiles", "MyFiles")]);
        let external = probe_external(&host).await.unwrap();
        external.write("IMG_1.jpg", b"data").await.unwrap();
        assert!(dir.path().join("MyFiles").join("Downloads").join("IMG_1.jpg").is_file());
    }

    #[tokio::test]
    async fn test_my_files_without_downloads_is_absent() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("MyFiles")).unwrap();
        let host = host_with(&dir, &[("downloads:MyFiles", "MyFiles")]);
        assert!(probe_external(&host).await.is_none());
    }
}
