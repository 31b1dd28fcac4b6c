//! In-memory catalog of stored pictures.
//!
//! The [`Catalog`] is loaded once from the [`Resolver`]'s entries and then
//! kept in step with every save and delete it performs, sorted by capture
//! time (oldest first). [`PictureObserver`]s registered up front hear about
//! every picture as it enters or leaves the list, starting with the initial
//! load.
//!
//! Every operation waits for the load to finish. The load runs as its own
//! task: a caller that stops waiting does not cancel it, and it is never
//! started twice. A failed load is final: the catalog reports
//! [`LoadFailed`](error::ErrorKind::LoadFailed) from then on.

pub mod error;
mod observer;
mod picture;

pub use self::observer::PictureObserver;
pub use self::picture::Picture;
use self::error::{ErrorKind, Result};
use crate::MAX_TRANSFER_CONCURRENCY;
use crate::naming::{generate_name, thumbnail_name};
use crate::resolve::{Entries, Location, Resolver, StoredFile};
use exn::ResultExt;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::{StreamExt, stream};
use shutter_media::{CodecHandle, MediaKind, THUMBNAIL_WIDTH};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{Instrument, instrument};

type PictureList = Arc<Mutex<Vec<Arc<Picture>>>>;

#[derive(Clone)]
enum State {
    Ready(PictureList),
    Failed,
}

/// The single load, shared by everyone waiting on it.
type LoadTask = Shared<BoxFuture<'static, State>>;

pub struct Catalog {
    inner: Inner,
    load: OnceLock<LoadTask>,
}

/// The parts of a [`Catalog`] that detached tasks carry with them.
#[derive(Clone)]
struct Inner {
    resolver: Resolver,
    codec: CodecHandle,
    observers: Vec<Arc<dyn PictureObserver>>,
    thumbnail_width: u32,
}

/// Where a picture taken at `timestamp` goes: right after the last picture
/// taken at or before it.
fn insertion_index(pictures: &[Arc<Picture>], timestamp: OffsetDateTime) -> usize {
    pictures.iter().rposition(|p| p.timestamp() <= timestamp).map_or(0, |i| i + 1)
}

impl Inner {
    fn notify_added(&self, picture: &Arc<Picture>) {
        self.observers.iter().for_each(|o| o.on_picture_added(picture));
    }

    fn notify_deleted(&self, picture: &Arc<Picture>) {
        self.observers.iter().for_each(|o| o.on_picture_deleted(picture));
    }

    async fn initial_load(self) -> State {
        match self.load_pictures().await {
            Ok(pictures) => {
                tracing::info!(pictures = pictures.len(), "Picture catalog loaded");
                // Nobody can see the list before the load task returns it,
                // so observers hear about it first.
                pictures.iter().for_each(|picture| self.notify_added(picture));
                State::Ready(Arc::new(Mutex::new(pictures)))
            },
            Err(e) => {
                tracing::error!(error = ?e, "Failed to load picture catalog");
                State::Failed
            },
        }
    }

    async fn load_pictures(&self) -> Result<Vec<Arc<Picture>>> {
        let Entries { pictures, thumbnails } = self.resolver.get_entries().await.or_raise(|| ErrorKind::Storage)?;
        let wrapping: Vec<_> = pictures
            .into_iter()
            .map(|file| {
                let thumbnail = thumbnails.get(&thumbnail_name(&file.name)).cloned();
                self.wrap(file, thumbnail, None)
            })
            .collect();
        // Bounded, since regenerating a thumbnail reads the whole file.
        let mut wrapped: Vec<_> = stream::iter(wrapping).buffered(MAX_TRANSFER_CONCURRENCY).collect().await;
        // Stable, so equal timestamps keep listing order.
        wrapped.sort_by_key(|picture| picture.timestamp());
        Ok(wrapped)
    }

    /// Turn a primary file into a [`Picture`], generating its thumbnail if
    /// it has none. Thumbnail failures leave the picture without one.
    async fn wrap(&self, file: StoredFile, thumbnail: Option<StoredFile>, content: Option<&[u8]>) -> Arc<Picture> {
        let kind = file.kind().media_kind();
        let thumbnail = match thumbnail {
            Some(thumbnail) => Some(thumbnail),
            None if !self.codec.supports(kind) => {
                tracing::debug!(name = %file.name, %kind, "No thumbnail support for this kind of media");
                None
            },
            None => match self.create_thumbnail(&file, content).await {
                Ok(thumbnail) => Some(thumbnail),
                Err(e) => {
                    tracing::warn!(name = %file.name, error = ?e, "Failed to generate thumbnail");
                    None
                },
            },
        };
        Arc::new(Picture::new(file, thumbnail, self.resolver.zone()))
    }

    async fn create_thumbnail(&self, file: &StoredFile, content: Option<&[u8]>) -> Result<StoredFile> {
        let read;
        let content = match content {
            Some(content) => content,
            None => {
                read = self.resolver.read(file).await.or_raise(|| ErrorKind::Storage)?;
                read.as_slice()
            },
        };
        let thumbnail = self
            .codec
            .thumbnail(content, file.kind().media_kind(), self.thumbnail_width)
            .await
            .or_raise(|| ErrorKind::Media)?;
        self.resolver
            .save(Location::Internal, &thumbnail_name(&file.name), &thumbnail)
            .await
            .or_raise(|| ErrorKind::Storage)
    }

    /// Write new media under a fresh name and add it to `list`.
    async fn store(&self, list: &Mutex<Vec<Arc<Picture>>>, content: &[u8], kind: MediaKind) -> Result<Arc<Picture>> {
        let name = generate_name(kind, OffsetDateTime::now_utc(), self.resolver.zone());
        let file = self
            .resolver
            .save(self.resolver.authoritative(), &name, content)
            .await
            .or_raise(|| ErrorKind::Storage)?;
        let picture = self.wrap(file, None, Some(content)).await;

        let mut pictures = list.lock().await;
        let index = insertion_index(&pictures, picture.timestamp());
        pictures.insert(index, picture.clone());
        self.notify_added(&picture);
        tracing::debug!(name = %picture.name(), index, "Picture added");
        Ok(picture)
    }
}

impl Catalog {
    pub fn new(resolver: Resolver, codec: CodecHandle) -> Self {
        Self {
            inner: Inner {
                resolver,
                codec,
                observers: Vec::new(),
                thumbnail_width: THUMBNAIL_WIDTH,
            },
            load: OnceLock::new(),
        }
    }

    /// Register an observer. Only observers registered before the first
    /// operation see the initial load.
    pub fn with_observer(mut self, observer: Arc<dyn PictureObserver>) -> Self {
        self.inner.observers.push(observer);
        self
    }

    pub fn with_thumbnail_width(mut self, width: u32) -> Self {
        self.inner.thumbnail_width = width;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.inner.resolver
    }

    /// The loaded list, starting the load if nobody has yet.
    async fn list(&self) -> Result<PictureList> {
        let load = self.load.get_or_init(|| self.spawn_load()).clone();
        match load.await {
            State::Ready(list) => Ok(list),
            State::Failed => exn::bail!(ErrorKind::LoadFailed),
        }
    }

    fn spawn_load(&self) -> LoadTask {
        let task = tokio::spawn(self.inner.clone().initial_load().in_current_span());
        async move {
            task.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Picture catalog load task failed");
                State::Failed
            })
        }
        .boxed()
        .shared()
    }

    /// Wait for the catalog to load.
    pub async fn load(&self) -> Result<()> {
        self.list().await.map(|_| ())
    }

    /// Snapshot of every picture, oldest first.
    pub async fn pictures(&self) -> Result<Vec<Arc<Picture>>> {
        Ok(self.list().await?.lock().await.clone())
    }

    pub async fn last_picture(&self) -> Result<Option<Arc<Picture>>> {
        Ok(self.list().await?.lock().await.last().cloned())
    }

    /// Picture whose primary file is called `name`.
    pub async fn find(&self, name: &str) -> Result<Option<Arc<Picture>>> {
        Ok(self.list().await?.lock().await.iter().find(|p| p.name() == name).cloned())
    }

    /// Store newly captured media and add it to the catalog.
    ///
    /// Images have their EXIF orientation applied first; if that fails the
    /// bytes are stored as given. The picture is named after the current
    /// time and saved where new pictures belong (see
    /// [`Resolver::authoritative`]). Once orientation is done, the rest
    /// runs as its own task: a caller that stops waiting still gets the
    /// picture stored, listed and announced.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn save_picture(&self, content: &[u8], kind: MediaKind) -> Result<Arc<Picture>> {
        let list = self.list().await?;
        let content = match kind {
            MediaKind::Image => match self.inner.codec.orient(content).await {
                Ok(oriented) => oriented,
                Err(e) => {
                    tracing::warn!(error = ?e, "Failed to orient image, saving as captured");
                    content.to_vec()
                },
            },
            MediaKind::Video => content.to_vec(),
        };

        let inner = self.inner.clone();
        tokio::spawn(async move { inner.store(&list, &content, kind).await }.in_current_span())
            .await
            .or_raise(|| ErrorKind::Task)?
    }

    /// Remove a picture from storage and from the catalog.
    ///
    /// With `already_removed` the primary file is assumed gone and only the
    /// catalog entry and thumbnail are cleaned up. Observers are told about
    /// the deletion even if the picture was no longer listed.
    #[instrument(skip(self, picture), fields(name = %picture.name()))]
    pub async fn delete_picture(&self, picture: &Arc<Picture>, already_removed: bool) -> Result<()> {
        let list = self.list().await?;
        let resolver = &self.inner.resolver;
        if !already_removed {
            resolver.remove(picture.file()).await.or_raise(|| ErrorKind::Storage)?;
        }
        {
            let mut pictures = list.lock().await;
            if let Some(index) = pictures.iter().position(|p| p == picture) {
                pictures.remove(index);
            }
            self.inner.notify_deleted(picture);
        }
        if let Some(thumbnail) = picture.thumbnail()
            && let Err(e) = resolver.remove(thumbnail).await
        {
            tracing::warn!(name = %thumbnail.name, error = ?e, "Failed to delete thumbnail");
        }
        Ok(())
    }

    /// Copy a picture's primary file to `target` outside managed storage.
    pub async fn export_picture(&self, picture: &Picture, target: &Path) -> Result<()> {
        self.list().await?;
        self.inner.resolver.export(picture.file(), target).await.or_raise(|| ErrorKind::Export)
    }

    /// Drop pictures from the end of the catalog whose files were removed
    /// behind its back, returning the last picture that still exists.
    ///
    /// Only the external location is checked; files there are visible to
    /// (and deletable by) the user.
    pub async fn check_last_picture(&self) -> Result<Option<Arc<Picture>>> {
        let list = self.list().await?;
        let resolver = &self.inner.resolver;
        loop {
            let Some(last) = list.lock().await.last().cloned() else {
                return Ok(None);
            };
            if !resolver.has_external() || resolver.exists(last.file()).await.or_raise(|| ErrorKind::Storage)? {
                return Ok(Some(last));
            }
            tracing::info!(name = %last.name(), "Last picture was removed externally");
            self.delete_picture(&last, true).await?;
        }
    }

    /// URL of the primary file; see [`Resolver::resolve_readable_url`].
    pub async fn picture_url(&self, picture: &Picture) -> Result<String> {
        self.inner.resolver.resolve_readable_url(picture.file()).await.or_raise(|| ErrorKind::Storage)
    }

    /// URL of the thumbnail, if the picture has one.
    pub async fn thumbnail_url(&self, picture: &Picture) -> Result<Option<String>> {
        let Some(thumbnail) = picture.thumbnail() else {
            return Ok(None);
        };
        if let Some(url) = self.inner.resolver.native_url(thumbnail) {
            return Ok(Some(url));
        }
        self.inner.resolver.inline_url(thumbnail).await.map(Some).or_raise(|| ErrorKind::Storage)
    }
}
