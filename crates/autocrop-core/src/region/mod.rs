//! Content-aware crop region selection.
//!
//! Given a decoded raster and a target size, pick the rectangle of the
//! target's aspect ratio that holds the most visually important content.
//!
//! # Algorithm
//!
//! 1. Build an importance map from edge detail, skin tone and saturation on
//!    a downscaled copy of the image, and accumulate it into a summed-area
//!    table.
//! 2. Fix the crop size: the target itself when it fits, otherwise the
//!    largest same-aspect rectangle inside the image.
//! 3. Slide that rectangle over a coarse grid of origins and keep the one
//!    with the highest aggregate importance, preferring the most central
//!    candidate on ties.
//!
//! Selection is a pure function of its inputs.

mod importance;
mod options;
mod select;

pub use options::SelectorOptions;
pub use select::{crop_size, select_crop_region, select_crop_region_with};

use thiserror::Error;

/// No valid crop region exists for the given image and target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("target dimensions must be positive, got {width}x{height}")]
    EmptyTarget { width: u32, height: u32 },

    #[error(
        "target aspect {target_width}x{target_height} cannot fit a non-empty \
         rectangle inside {image_width}x{image_height}"
    )]
    AspectUnsatisfiable {
        target_width: u32,
        target_height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    MalformedRaster { expected: usize, actual: usize },
}
