//! Built-in [`MediaCodec`] for still images.

use crate::error::{ErrorKind, Result};
use crate::orient::orient_jpeg;
use crate::thumbnail::thumbnail_jpeg;
use crate::{MediaCodec, MediaKind};
use async_trait::async_trait;
use exn::ResultExt;

/// Still-image codec backed by the `image` crate.
///
/// Decoding and encoding run inside [`spawn_blocking`](tokio::task::spawn_blocking).
/// Videos are not supported: [`thumbnail`](MediaCodec::thumbnail) fails with
/// [`Unsupported`](ErrorKind::Unsupported) and callers are expected to carry
/// on without a thumbnail.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageCodec;

#[async_trait]
impl MediaCodec for ImageCodec {
    fn supports(&self, kind: MediaKind) -> bool {
        !kind.is_video()
    }

    async fn thumbnail(&self, media: &[u8], kind: MediaKind, width: u32) -> Result<Vec<u8>> {
        if kind.is_video() {
            exn::bail!(ErrorKind::Unsupported(kind.to_string()));
        }
        let media = media.to_vec();
        tokio::task::spawn_blocking(move || thumbnail_jpeg(&media, width))
            .await
            .or_raise(|| ErrorKind::Task)?
    }

    async fn orient(&self, image: &[u8]) -> Result<Vec<u8>> {
        let image = image.to_vec();
        tokio::task::spawn_blocking(move || orient_jpeg(&image)).await.or_raise(|| ErrorKind::Task)?
    }
}
