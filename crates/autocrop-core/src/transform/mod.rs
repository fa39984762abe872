//! Crop geometry shared by the region selector and the transcoder.
//!
//! # Coordinate System
//!
//! - Coordinates are integer pixels in the decoded (upright) raster
//! - Origin is top-left corner
//! - Right and bottom edges are exclusive

mod crop;
mod rect;

pub use crop::SubImage;
pub use rect::CropRect;
