//! Encoding side of the transcoder.
//!
//! This module provides functionality for:
//! - Encoding RGB rasters to JPEG with a 0-100 quality setting
//! - Rendering a crop rectangle of a raster and encoding the result
//!
//! # Examples
//!
//! ```ignore
//! use autocrop_core::encode::render_and_encode;
//! use autocrop_core::transform::CropRect;
//!
//! let jpeg = render_and_encode(&image, CropRect::new(0, 0, 500, 500), 100)?;
//! println!("Encoded {} bytes", jpeg.len());
//! ```

mod jpeg;
mod render;

pub use jpeg::{encode_jpeg, EncodeError, MAX_QUALITY};
pub use render::render_and_encode;
