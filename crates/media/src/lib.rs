//! Media decode/re-encode capability.
//!
//! The picture library never touches pixels itself; it hands raw bytes to a
//! [`MediaCodec`] and gets JPEG bytes back:
//!
//! - **Thumbnails** ([`MediaCodec::thumbnail`]) scaled to a fixed width with
//!   the aspect ratio preserved.
//! - **Auto-orientation** ([`MediaCodec::orient`]) baking the EXIF
//!   orientation of a still image into its pixels.
//!
//! [`ImageCodec`] is the built-in implementation for still images. Hosts
//! that can decode video frames provide their own codec.

mod codec;
pub mod error;
mod orient;
mod thumbnail;

pub use crate::codec::ImageCodec;
pub use crate::orient::orientation;
use crate::error::Result;
use async_trait::async_trait;
use derive_more::Display;
use std::sync::Arc;

/// Width, in pixels, of every generated thumbnail.
pub const THUMBNAIL_WIDTH: u32 = 480;

/// Quality used for every JPEG this crate encodes.
pub(crate) const JPEG_QUALITY: u8 = 90;

pub type CodecHandle = Arc<dyn MediaCodec + Send + Sync>;

/// The two kinds of primary media a picture can hold.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Still picture
    #[default]
    #[display("image")]
    Image,
    /// Motion picture
    #[display("video")]
    Video,
}
impl MediaKind {
    pub fn is_video(self) -> bool {
        matches!(self, Self::Video)
    }
}

/// Replaceable decode/re-encode service.
///
/// Both operations are pure functions of their input bytes. Implementations
/// are expected to move CPU-heavy work off the async executor.
#[async_trait]
pub trait MediaCodec: Send + Sync {
    /// Whether [`thumbnail`](Self::thumbnail) can handle `kind` at all.
    /// Callers skip reading media the codec would reject anyway.
    fn supports(&self, _kind: MediaKind) -> bool {
        true
    }

    /// Decode `media` (the image, or the first frame of a video), scale it
    /// to `width` pixels wide preserving aspect ratio, and encode it as JPEG.
    async fn thumbnail(&self, media: &[u8], kind: MediaKind, width: u32) -> Result<Vec<u8>>;

    /// Rotate/flip a still image according to its EXIF orientation.
    ///
    /// Returns the input unchanged when no transformation is required.
    async fn orient(&self, image: &[u8]) -> Result<Vec<u8>>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// Encode a solid-colour test image in the given format.
    pub fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).unwrap();
        out.into_inner()
    }
}
