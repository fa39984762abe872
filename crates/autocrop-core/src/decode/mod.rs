//! Decoding side of the transcoder.
//!
//! JPEG is the single accepted input format. Bytes in any other container
//! fail with [`DecodeError::UnsupportedFormat`] rather than being decoded
//! through a different codec. EXIF orientation is applied during decode so
//! the region selector always sees an upright raster.
//!
//! # Examples
//!
//! ```ignore
//! use autocrop_core::decode::decode_jpeg;
//!
//! let jpeg_bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_jpeg(&jpeg_bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod jpeg;
mod types;

pub use jpeg::decode_jpeg;
pub use types::{DecodeError, DecodedImage, Orientation};
