//! Storage location resolution and one-time picture migration.
//!
//! A [`Resolver`] owns the two storage locations pictures can live in: the
//! sandboxed [internal](Location::Internal) store, which always exists, and
//! an [external](Location::External) user-visible directory, present only
//! when the host exposes a suitable volume. When an external location
//! appears for the first time, pictures still held internally are moved
//! there (after asking the user once); from then on the internal store only
//! holds thumbnails.
//!
//! The entry point is [`Resolver::initialize`]. Everything else is a thin
//! uniform layer over the two [`StorageBackend`](shutter_storage::StorageBackend)s
//! that hides collision handling and URL construction.

pub mod error;
mod file;
mod migrate;

pub use self::file::{Location, StoredFile};
use self::error::{ErrorKind, Result};
use crate::host::{Host, probe_external};
use crate::naming::{TimeZone, increment_name, is_timestamped};
use crate::settings::{ACK_MIGRATE_PICTURES, MEDIA_CONSOLIDATED, SettingsStore};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::ResultExt;
use shutter_config::DEFAULT_INTERNAL_QUOTA;
use shutter_storage::BackendHandle;
use shutter_storage::error::ErrorKind as StorageErrorKind;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::path::Path;
use tracing::instrument;

#[derive(Clone, Copy, Debug)]
pub struct ResolverOptions {
    /// Capacity of the internal store, in bytes.
    pub quota: u64,
    /// Time zone for regulating legacy names during migration.
    pub zone: TimeZone,
}
impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            quota: DEFAULT_INTERNAL_QUOTA,
            zone: TimeZone::Local,
        }
    }
}

/// Outcome of [`Resolver::initialize`].
#[derive(Debug)]
pub enum Initialization {
    Ready(Resolver),
    /// The user declined moving pictures to the external location. Nothing
    /// was copied and no state was recorded; the caller should stop.
    Declined,
}

/// Files relevant to the picture catalog, as found in storage.
#[derive(Debug, Default)]
pub struct Entries {
    /// Primary picture files, in no particular order.
    pub pictures: Vec<StoredFile>,
    /// Thumbnails in the internal store, by name.
    pub thumbnails: HashMap<String, StoredFile>,
}

#[derive(Clone)]
pub struct Resolver {
    internal: BackendHandle,
    external: Option<BackendHandle>,
    zone: TimeZone,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("internal", &self.internal.name())
            .field("external", &self.external.as_ref().map(|e| e.name()))
            .field("zone", &self.zone)
            .finish()
    }
}

async fn read_flag(settings: &dyn SettingsStore, key: &str) -> bool {
    match settings.get_bool(key, false).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = ?e, "Settings unavailable, assuming unset");
            false
        },
    }
}

async fn write_flag(settings: &dyn SettingsStore, key: &str) -> Result<()> {
    settings.set_bool(key, true).await.or_raise(|| ErrorKind::Settings)
}

impl Resolver {
    /// Acquire both storage locations and bring them into a consistent
    /// state, migrating pictures out of the internal store if needed.
    ///
    /// `prompt` is awaited at most once, only when there are pictures to
    /// migrate and the user has not agreed to a migration before. Returning
    /// `false` yields [`Initialization::Declined`].
    ///
    /// # Errors
    /// - [`InternalUnavailable`](ErrorKind::InternalUnavailable) if the
    ///   internal store cannot be acquired.
    /// - [`Inconsistent`](ErrorKind::Inconsistent) if a previous run
    ///   consolidated pictures into an external location that is now gone.
    /// - [`Migration`](ErrorKind::Migration) if any picture fails to copy.
    ///   Pictures already copied are not rolled back; the next run picks up
    ///   the rest.
    #[instrument(skip_all)]
    pub async fn initialize<P>(
        host: &dyn Host,
        settings: &dyn SettingsStore,
        options: ResolverOptions,
        prompt: P,
    ) -> Result<Initialization>
    where
        P: AsyncFnOnce() -> bool,
    {
        let (internal, external, acknowledged, consolidated) = tokio::join!(
            host.internal_store(options.quota),
            probe_external(host),
            read_flag(settings, ACK_MIGRATE_PICTURES),
            read_flag(settings, MEDIA_CONSOLIDATED),
        );
        let resolver = Self {
            internal: internal.or_raise(|| ErrorKind::InternalUnavailable)?,
            external,
            zone: options.zone,
        };
        tracing::debug!(?resolver, acknowledged, consolidated, "Storage acquired");

        if consolidated && resolver.external.is_none() {
            exn::bail!(ErrorKind::Inconsistent);
        }
        if consolidated || resolver.external.is_none() {
            return Ok(Initialization::Ready(resolver));
        }

        if !resolver.has_internal_pictures().await? {
            // Nothing left to move: equivalent to a finished migration.
            write_flag(settings, ACK_MIGRATE_PICTURES).await?;
            write_flag(settings, MEDIA_CONSOLIDATED).await?;
            return Ok(Initialization::Ready(resolver));
        }

        if !acknowledged {
            if !prompt().await {
                tracing::info!("Picture migration declined");
                return Ok(Initialization::Declined);
            }
            write_flag(settings, ACK_MIGRATE_PICTURES).await?;
        }

        let migrated = migrate::migrate(&resolver).await?;
        write_flag(settings, MEDIA_CONSOLIDATED).await?;
        tracing::info!(migrated, "Pictures moved to external storage");
        Ok(Initialization::Ready(resolver))
    }

    /// Construct a resolver over already-consistent locations.
    #[cfg(test)]
    pub(crate) fn from_parts(internal: BackendHandle, external: Option<BackendHandle>, zone: TimeZone) -> Self {
        Self { internal, external, zone }
    }

    async fn has_internal_pictures(&self) -> Result<bool> {
        let files = self.enumerate(Location::Internal).await?;
        Ok(files.iter().any(|f| !f.kind().is_thumbnail()))
    }

    fn backend(&self, location: Location) -> Option<&BackendHandle> {
        match location {
            Location::Internal => Some(&self.internal),
            Location::External => self.external.as_ref(),
        }
    }

    fn require(&self, location: Location) -> Result<&BackendHandle> {
        match self.backend(location) {
            Some(backend) => Ok(backend),
            None => exn::bail!(ErrorKind::Absent(location)),
        }
    }

    pub fn zone(&self) -> TimeZone {
        self.zone
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    /// Where new pictures go: external when present, otherwise internal.
    pub fn authoritative(&self) -> Location {
        if self.has_external() { Location::External } else { Location::Internal }
    }

    /// Every file directly in `location`. An absent location is empty.
    pub async fn enumerate(&self, location: Location) -> Result<Vec<StoredFile>> {
        let Some(backend) = self.backend(location) else {
            return Ok(Vec::new());
        };
        let files = backend.list().await.or_raise(|| ErrorKind::Storage)?;
        Ok(files.into_iter().map(|info| StoredFile::new(location, info)).collect())
    }

    /// Look up `name` in `location`.
    ///
    /// With `create`, a new empty file is created instead; if `name` is
    /// taken, [`increment_name`] is applied until a free name is found, so
    /// the returned file may be named differently. Without `create`, a
    /// missing file is `None`. An absent location is always `None`.
    pub async fn get_file(&self, location: Location, name: &str, create: bool) -> Result<Option<StoredFile>> {
        let Some(backend) = self.backend(location) else {
            return Ok(None);
        };
        if !create {
            return match backend.stat(name).await {
                Ok(info) => Ok(Some(StoredFile::new(location, info))),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e).or_raise(|| ErrorKind::Storage),
            };
        }
        let mut candidate = name.to_string();
        loop {
            match backend.create(&candidate, &[]).await {
                Ok(info) => return Ok(Some(StoredFile::new(location, info))),
                Err(e) if matches!(e.deref(), StorageErrorKind::AlreadyExists(_)) => {
                    candidate = increment_name(&candidate);
                },
                Err(e) => return Err(e).or_raise(|| ErrorKind::Storage),
            }
        }
    }

    /// Store `content` in `location` under `name`, or under the next free
    /// name if `name` is taken.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn save(&self, location: Location, name: &str, content: &[u8]) -> Result<StoredFile> {
        let backend = self.require(location)?;
        let Some(placeholder) = self.get_file(location, name, true).await? else {
            exn::bail!(ErrorKind::Absent(location));
        };
        if let Err(e) = backend.write(&placeholder.name, content).await {
            if let Err(cleanup) = backend.delete(&placeholder.name).await {
                tracing::warn!(name = %placeholder.name, error = ?cleanup, "Failed to remove empty placeholder");
            }
            return Err(e).or_raise(|| ErrorKind::Storage);
        }
        let info = backend.stat(&placeholder.name).await.or_raise(|| ErrorKind::Storage)?;
        Ok(StoredFile::new(location, info))
    }

    pub async fn read(&self, file: &StoredFile) -> Result<Vec<u8>> {
        self.require(file.location)?.read(&file.name).await.or_raise(|| ErrorKind::Storage)
    }

    pub async fn remove(&self, file: &StoredFile) -> Result<()> {
        self.require(file.location)?.delete(&file.name).await.or_raise(|| ErrorKind::Storage)
    }

    pub async fn exists(&self, file: &StoredFile) -> Result<bool> {
        match self.backend(file.location) {
            Some(backend) => backend.exists(&file.name).await.or_raise(|| ErrorKind::Storage),
            None => Ok(false),
        }
    }

    /// Give `file` a new name within its location, overwriting anything
    /// already called `name`.
    pub(crate) async fn relocate(&self, file: &StoredFile, name: &str) -> Result<StoredFile> {
        let backend = self.require(file.location)?;
        let content = backend.read(&file.name).await.or_raise(|| ErrorKind::Storage)?;
        backend.write(name, &content).await.or_raise(|| ErrorKind::Storage)?;
        backend.delete(&file.name).await.or_raise(|| ErrorKind::Storage)?;
        let info = backend.stat(name).await.or_raise(|| ErrorKind::Storage)?;
        Ok(StoredFile::new(file.location, info))
    }

    /// A URL a viewer can load `file` from.
    ///
    /// Files in an external location are inlined as `data:` URLs, since a
    /// location-native URL may not be readable by the viewer. Otherwise the
    /// backend's own URL is used, falling back to a `data:` URL for backends
    /// that have none.
    pub async fn resolve_readable_url(&self, file: &StoredFile) -> Result<String> {
        if !self.has_external()
            && let Some(url) = self.native_url(file)
        {
            return Ok(url);
        }
        self.inline_url(file).await
    }

    /// The backend's own URL for `file`, if it has one.
    pub fn native_url(&self, file: &StoredFile) -> Option<String> {
        self.backend(file.location)?.native_url(&file.name)
    }

    /// A `data:` URL carrying the whole content of `file`.
    pub async fn inline_url(&self, file: &StoredFile) -> Result<String> {
        let content = self.read(file).await?;
        Ok(data_url(&file.name, &content))
    }

    /// Files the picture catalog is built from.
    ///
    /// With an external location, primaries are its `IMG_`/`VID_` files
    /// that carry a timestamp; otherwise every non-thumbnail file in the
    /// internal store. Thumbnails always come from the internal store.
    #[instrument(skip(self))]
    pub async fn get_entries(&self) -> Result<Entries> {
        let (internal, external) =
            tokio::try_join!(self.enumerate(Location::Internal), self.enumerate(Location::External))?;
        let (thumbnails, internal): (Vec<_>, Vec<_>) = internal.into_iter().partition(|f| f.kind().is_thumbnail());
        let pictures = if self.has_external() {
            external
                .into_iter()
                .filter(|f| f.kind().is_prefixed() && is_timestamped(&f.name))
                .collect()
        } else {
            internal
        };
        tracing::debug!(pictures = pictures.len(), thumbnails = thumbnails.len(), "Entries listed");
        Ok(Entries {
            pictures,
            thumbnails: thumbnails.into_iter().map(|f| (f.name.clone(), f)).collect(),
        })
    }

    /// Copy `file` out of managed storage to `target`. When `target` is an
    /// existing directory the file keeps its name inside it.
    #[instrument(skip(self), fields(name = %file.name))]
    pub async fn export(&self, file: &StoredFile, target: &Path) -> Result<()> {
        let content = self.read(file).await.or_raise(|| ErrorKind::Export)?;
        let destination = match tokio::fs::metadata(target).await {
            Ok(metadata) if metadata.is_dir() => target.join(&file.name),
            _ => target.to_path_buf(),
        };
        tokio::fs::write(&destination, content).await.or_raise(|| ErrorKind::Export)?;
        tracing::debug!(destination = %destination.display(), "File exported");
        Ok(())
    }
}

fn mime_type(name: &str) -> &'static str {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

fn data_url(name: &str, content: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type(name), BASE64.encode(content))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::host::testing::StaticHost;
    use crate::settings::MemorySettings;
    use shutter_storage::backend::MockBackend;
    use std::sync::Arc;

    /// Two mock locations plus in-memory settings.
    pub(crate) struct Fixture {
        pub internal: Arc<MockBackend>,
        pub external: Option<Arc<MockBackend>>,
        pub settings: MemorySettings,
    }

    impl Fixture {
        pub fn new<'a>(internal: &[(&'a str, &'a str)], external: Option<&[(&'a str, &'a str)]>) -> Self {
            Self {
                internal: Arc::new(MockBackend::with_files(internal.iter().copied()).with_name("internal")),
                external: external.map(|files| Arc::new(MockBackend::with_files(files.iter().copied()).with_name("external"))),
                settings: MemorySettings::default(),
            }
        }

        pub fn host(&self) -> StaticHost {
            StaticHost {
                internal: Some(self.internal.clone() as BackendHandle),
                external: self.external.clone().map(|e| e as BackendHandle),
            }
        }

        pub fn resolver(&self) -> Resolver {
            Resolver::from_parts(
                self.internal.clone(),
                self.external.clone().map(|e| e as BackendHandle),
                TimeZone::UTC,
            )
        }

        pub async fn initialize(&self, prompt: impl AsyncFnOnce() -> bool) -> Result<Initialization> {
            let options = ResolverOptions {
                zone: TimeZone::UTC,
                ..ResolverOptions::default()
            };
            Resolver::initialize(&self.host(), &self.settings, options, prompt).await
        }

        pub async fn external_names(&self) -> Vec<String> {
            match &self.external {
                Some(external) => external.names().await,
                None => Vec::new(),
            }
        }
    }

    pub(crate) async fn no_prompt() -> bool {
        panic!("migration prompt should not be shown");
    }

    pub(crate) fn ready(init: Initialization) -> Resolver {
        match init {
            Initialization::Ready(resolver) => resolver,
            Initialization::Declined => panic!("initialization unexpectedly declined"),
        }
    }
}
