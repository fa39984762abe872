//! JPEG encoding for the cropped output.
//!
//! Quality is taken on a 0-100 scale where 100 means maximum fidelity. The
//! underlying encoder's floor is 1, so 0 is encoded as 1. Anything above 100
//! is rejected rather than clamped.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use thiserror::Error;

/// Highest accepted quality value.
pub const MAX_QUALITY: u8 = 100;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// Quality outside the 0-100 scale
    #[error("Invalid quality {0}: must be between 0 and 100")]
    InvalidQuality(u8),

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality (0-100, where 100 is highest quality)
///
/// # Example
///
/// ```
/// use autocrop_core::encode::encode_jpeg;
///
/// let pixels = vec![128u8; 100 * 100 * 3];
/// let jpeg = encode_jpeg(&pixels, 100, 100, 90).unwrap();
/// assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
/// ```
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    if quality > MAX_QUALITY {
        return Err(EncodeError::InvalidQuality(quality));
    }

    let mut buffer = Vec::with_capacity(expected_len / 4);
    JpegEncoder::new_with_quality(&mut buffer, quality.max(1))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Same input always produces same output (deterministic).
        #[test]
        fn prop_deterministic_output(
            (width, height) in (1u32..=20, 1u32..=20),
            quality in 0u8..=100,
        ) {
            let pixels: Vec<u8> = (0..(width * height * 3) as usize)
                .map(|i| ((i * 37) % 256) as u8)
                .collect();

            let first = encode_jpeg(&pixels, width, height, quality);
            let second = encode_jpeg(&pixels, width, height, quality);

            prop_assert!(first.is_ok());
            prop_assert_eq!(first, second, "Same input should produce same output");
        }

        /// Property: Every quality above the scale is rejected.
        #[test]
        fn prop_out_of_scale_quality_rejected(quality in 101u8..=255) {
            let pixels = vec![128u8; 4 * 4 * 3];
            prop_assert_eq!(
                encode_jpeg(&pixels, 4, 4, quality),
                Err(EncodeError::InvalidQuality(quality))
            );
        }
    }
}
