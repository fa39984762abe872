//! Render a crop of a raster and encode it.

use super::{encode_jpeg, EncodeError};
use crate::transform::{CropRect, SubImage};

/// Extract the region bounded by `rect` and encode it as JPEG.
///
/// The output decodes to exactly `rect.width x rect.height` pixels.
///
/// # Panics
///
/// Panics if `rect` does not lie within the raster. Rectangles produced by the
/// region selector always do.
pub fn render_and_encode<R: SubImage>(
    image: &R,
    rect: CropRect,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let cropped = image.sub_image(rect);
    encode_jpeg(&cropped.pixels, cropped.width, cropped.height, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode_jpeg, DecodedImage};

    fn checker(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x / 4 + y / 4) % 2 == 0 { 230 } else { 20 };
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_render_and_encode_dimensions() {
        let img = checker(120, 80);
        let jpeg = render_and_encode(&img, CropRect::new(10, 5, 50, 40), 100).unwrap();
        let decoded = decode_jpeg(&jpeg).unwrap();

        assert_eq!((decoded.width, decoded.height), (50, 40));
    }

    #[test]
    fn test_render_and_encode_rejects_quality() {
        let img = checker(16, 16);
        let result = render_and_encode(&img, CropRect::full(16, 16), 150);
        assert_eq!(result, Err(EncodeError::InvalidQuality(150)));
    }

    #[test]
    #[should_panic]
    fn test_render_and_encode_out_of_bounds() {
        let img = checker(16, 16);
        let _ = render_and_encode(&img, CropRect::new(8, 8, 16, 16), 90);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
