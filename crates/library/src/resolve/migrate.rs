use super::error::{ErrorKind, Result};
use super::{Location, Resolver, StoredFile};
use crate::MAX_TRANSFER_CONCURRENCY;
use crate::naming::{regulate_name, thumbnail_name};
use exn::ResultExt;
use futures::{StreamExt, TryStreamExt, stream};
use std::collections::HashMap;

/// Move every picture out of the internal store into the external one,
/// returning how many were moved.
///
/// Pictures are copied concurrently, up to [`MAX_TRANSFER_CONCURRENCY`] at a
/// time. A failed copy fails the whole migration, while failures tidying up
/// afterwards (relocating a thumbnail, deleting the internal original) are
/// only logged.
pub(super) async fn migrate(resolver: &Resolver) -> Result<usize> {
    let files = resolver.enumerate(Location::Internal).await.or_raise(|| ErrorKind::Migration)?;
    let (thumbnails, pictures): (Vec<_>, Vec<_>) = files.into_iter().partition(|f| f.kind().is_thumbnail());
    let thumbnails: HashMap<String, StoredFile> = thumbnails.into_iter().map(|f| (f.name.clone(), f)).collect();

    let migrations: Vec<_> = pictures
        .into_iter()
        .map(|picture| {
            let thumbnail = thumbnails.get(&thumbnail_name(&picture.name));
            migrate_picture(resolver, picture, thumbnail)
        })
        .collect();
    let count = migrations.len();
    stream::iter(migrations)
        .buffer_unordered(MAX_TRANSFER_CONCURRENCY)
        .try_collect::<Vec<()>>()
        .await?;
    Ok(count)
}

async fn migrate_picture(resolver: &Resolver, picture: StoredFile, thumbnail: Option<&StoredFile>) -> Result<()> {
    let name = regulate_name(&picture.name, resolver.zone());
    let content = resolver.read(&picture).await.or_raise(|| ErrorKind::Migration)?;
    let copied = resolver.save(Location::External, &name, &content).await.or_raise(|| ErrorKind::Migration)?;

    if copied.name != picture.name
        && let Some(thumbnail) = thumbnail
    {
        // Thumbnails can be regenerated later, so losing one is harmless.
        let target = thumbnail_name(&copied.name);
        if let Err(e) = resolver.relocate(thumbnail, &target).await {
            tracing::warn!(from = %thumbnail.name, to = %target, error = ?e, "Failed to rename thumbnail");
        }
    }
    if let Err(e) = resolver.remove(&picture).await {
        tracing::warn!(name = %picture.name, error = ?e, "Failed to delete migrated picture");
    }
    tracing::debug!(from = %picture.name, to = %copied.name, "Picture migrated");
    Ok(())
}
