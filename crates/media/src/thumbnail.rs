//! Thumbnail scaling and JPEG encoding.

use crate::JPEG_QUALITY;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use tracing::instrument;

/// Height of a thumbnail `width` pixels wide for a source of the given
/// dimensions, rounded to the nearest pixel and never zero.
pub(crate) fn scaled_height(source_width: u32, source_height: u32, width: u32) -> Result<u32> {
    if source_width == 0 || source_height == 0 {
        exn::bail!(ErrorKind::Empty);
    }
    let ratio = f64::from(source_height) / f64::from(source_width);
    // Float to int casts saturate, so absurd aspect ratios cannot wrap.
    Ok(((f64::from(width) * ratio).round() as u32).max(1))
}

/// Decode a still image and produce a JPEG thumbnail `width` pixels wide.
#[instrument(skip(media), fields(input_size = media.len()))]
pub(crate) fn thumbnail_jpeg(media: &[u8], width: u32) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(media).or_raise(|| ErrorKind::Decode)?;
    let height = scaled_height(decoded.width(), decoded.height(), width)?;
    let scaled = decoded.resize_exact(width, height, FilterType::Triangle);
    encode_jpeg(&scaled.to_rgb8())
}

/// Encode RGB pixels as JPEG. Alpha channels must be dropped beforehand;
/// JPEG has no room for them.
pub(crate) fn encode_jpeg(pixels: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    pixels
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .or_raise(|| ErrorKind::Encode)?;
    Ok(out)
}

/// Convenience for callers holding an already-decoded image.
pub(crate) fn encode_dynamic(image: &DynamicImage) -> Result<Vec<u8>> {
    encode_jpeg(&image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::encoded;
    use image::{GenericImageView, ImageFormat};
    use rstest::rstest;

    #[rstest]
    #[case(1920, 1080, 480, 270)]
    #[case(1080, 1920, 480, 853)]
    #[case(640, 480, 480, 360)]
    #[case(480, 480, 480, 480)]
    #[case(10_000, 1, 480, 1)]
    fn test_scaled_height(#[case] w: u32, #[case] h: u32, #[case] width: u32, #[case] expected: u32) {
        assert_eq!(scaled_height(w, h, width).unwrap(), expected);
    }

    #[test]
    fn test_scaled_height_empty_source() {
        assert_eq!(*scaled_height(0, 100, 480).unwrap_err(), ErrorKind::Empty);
        assert_eq!(*scaled_height(100, 0, 480).unwrap_err(), ErrorKind::Empty);
    }

    #[rstest]
    #[case(ImageFormat::Png)]
    #[case(ImageFormat::Jpeg)]
    fn test_thumbnail_dimensions(#[case] format: ImageFormat) {
        let source = encoded(960, 720, format);
        let thumb = thumbnail_jpeg(&source, 480).unwrap();
        let decoded = image::load_from_memory_with_format(&thumb, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (480, 360));
    }

    #[test]
    fn test_thumbnail_rejects_garbage() {
        let err = thumbnail_jpeg(b"definitely not an image", 480).unwrap_err();
        assert_eq!(*err, ErrorKind::Decode);
    }
}
