//! Bounded sub-region extraction.
//!
//! [`SubImage`] is the single raster capability the pipeline needs from an
//! image: produce a copy bounded by a [`CropRect`]. The rectangle must already
//! lie within the raster; passing one that does not is a caller bug and
//! panics.

use super::CropRect;
use crate::decode::DecodedImage;

/// A raster that can produce a copy of one of its rectangular regions.
pub trait SubImage {
    /// Copy the pixels bounded by `rect`.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is empty or extends beyond the raster bounds.
    fn sub_image(&self, rect: CropRect) -> DecodedImage;
}

impl SubImage for DecodedImage {
    fn sub_image(&self, rect: CropRect) -> DecodedImage {
        assert!(
            rect.fits_within(self.width, self.height),
            "crop {} outside {}x{} raster",
            rect,
            self.width,
            self.height
        );

        // Fast path: full crop returns a clone
        if rect == CropRect::full(self.width, self.height) {
            return self.clone();
        }

        let src_stride = self.width as usize * 3;
        let row_len = rect.width as usize * 3;
        let mut output = Vec::with_capacity(row_len * rect.height as usize);

        for y in rect.y..rect.y + rect.height {
            let start = y as usize * src_stride + rect.x as usize * 3;
            output.extend_from_slice(&self.pixels[start..start + row_len]);
        }

        DecodedImage {
            width: rect.width,
            height: rect.height,
            pixels: output,
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
