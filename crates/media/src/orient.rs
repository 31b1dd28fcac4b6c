//! EXIF orientation handling.

use crate::error::{ErrorKind, Result};
use crate::thumbnail::encode_dynamic;
use exn::ResultExt;
use image::DynamicImage;
use std::io::Cursor;

/// Read the EXIF orientation tag (1–8) of an encoded image.
///
/// Returns `None` when the image carries no EXIF data or no orientation.
pub fn orientation(image: &[u8]) -> Option<u32> {
    let exif = exif::Reader::new().read_from_container(&mut Cursor::new(image)).ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

/// Apply an EXIF orientation to decoded pixels.
///
/// Values outside 2–8 (including the identity, 1) return `None`.
fn transform(image: &DynamicImage, orientation: u32) -> Option<DynamicImage> {
    let transformed = match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => return None,
    };
    Some(transformed)
}

/// Bake the EXIF orientation of `image` into its pixels, re-encoding as
/// JPEG. Images that need no transformation are returned as-is so they
/// never lose quality to a pointless re-encode.
pub(crate) fn orient_jpeg(image: &[u8]) -> Result<Vec<u8>> {
    let Some(orientation) = orientation(image).filter(|o| (2..=8).contains(o)) else {
        return Ok(image.to_vec());
    };
    let decoded = image::load_from_memory(image).or_raise(|| ErrorKind::Decode)?;
    match transform(&decoded, orientation) {
        Some(oriented) => {
            tracing::debug!(orientation, "Applied EXIF orientation");
            encode_dynamic(&oriented)
        },
        None => Ok(image.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::encoded;
    use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
    use rstest::rstest;

    #[test]
    fn test_no_exif_is_untouched() {
        let source = encoded(40, 20, ImageFormat::Jpeg);
        assert_eq!(orientation(&source), None);
        assert_eq!(orient_jpeg(&source).unwrap(), source);
    }

    #[test]
    fn test_non_image_without_exif_is_untouched() {
        // Nothing to orient means nothing to decode either.
        assert_eq!(orient_jpeg(b"raw bytes").unwrap(), b"raw bytes");
    }

    #[rstest]
    #[case(1, None)]
    #[case(2, Some((4, 2)))]
    #[case(3, Some((4, 2)))]
    #[case(4, Some((4, 2)))]
    #[case(5, Some((2, 4)))]
    #[case(6, Some((2, 4)))]
    #[case(7, Some((2, 4)))]
    #[case(8, Some((2, 4)))]
    #[case(9, None)]
    fn test_transform_dimensions(#[case] orientation: u32, #[case] expected: Option<(u32, u32)>) {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([1, 2, 3])));
        assert_eq!(transform(&image, orientation).map(|i| i.dimensions()), expected);
    }

    #[test]
    fn test_rotate_moves_pixels() {
        let mut pixels = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        pixels.put_pixel(0, 0, Rgb([255, 255, 255]));
        let image = DynamicImage::ImageRgb8(pixels);
        // Orientation 6: rotate 90° clockwise, top-left ends up top-right.
        let rotated = transform(&image, 6).unwrap().to_rgb8();
        assert_eq!(rotated.dimensions(), (1, 2));
        assert_eq!(rotated.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }
}
