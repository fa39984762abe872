//! Autocrop Core - content-aware crop pipeline
//!
//! This crate turns an uploaded JPEG into a fixed-size crop of its most
//! visually important region and writes the result back to object storage.
//!
//! - [`region`] picks the crop rectangle from edge detail, skin tone and
//!   saturation.
//! - [`decode`] and [`encode`] are the two halves of the transcoder.
//! - [`pipeline`] sequences fetch, decode, select, encode and upload, and
//!   stops at the first failure.
//! - [`storage`] is the object-store contract plus an in-memory store.

pub mod config;
pub mod decode;
pub mod encode;
pub mod location;
pub mod pipeline;
pub mod region;
pub mod storage;
pub mod transform;

pub use config::{ConfigError, CropConfig};
pub use decode::{decode_jpeg, DecodeError, DecodedImage};
pub use encode::{encode_jpeg, render_and_encode, EncodeError};
pub use location::{DestinationNaming, ObjectLocation};
pub use pipeline::{
    CropPipeline, CropRequest, CropResult, ImageJob, JobStatus, PipelineError, Stage,
};
pub use region::{select_crop_region, select_crop_region_with, RegionError, SelectorOptions};
pub use storage::{MemoryStorage, StorageClient, StorageError};
pub use transform::{CropRect, SubImage};
