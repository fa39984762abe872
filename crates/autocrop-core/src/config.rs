//! Pipeline configuration.
//!
//! A `CropConfig` is validated once when the pipeline is built and is
//! read-only afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::MAX_QUALITY;
use crate::location::DestinationNaming;
use crate::region::SelectorOptions;

pub const DEFAULT_TARGET_WIDTH: u32 = 500;
pub const DEFAULT_TARGET_HEIGHT: u32 = 500;
pub const DEFAULT_QUALITY: u8 = 100;
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("target dimensions must be positive, got {width}x{height}")]
    ZeroTarget { width: u32, height: u32 },

    #[error("quality {0} is outside 0-100")]
    QualityOutOfRange(u8),

    #[error("destination bucket prefix is empty, crops would land in the source bucket")]
    SourceBucketNaming,

    #[error("storage timeout must be positive")]
    ZeroTimeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Output width in pixels.
    pub target_width: u32,
    /// Output height in pixels.
    pub target_height: u32,
    /// JPEG quality, 0-100.
    pub quality: u8,
    pub naming: DestinationNaming,
    pub selector: SelectorOptions,
    /// Upper bound on each storage call.
    pub io_timeout: Duration,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
            quality: DEFAULT_QUALITY,
            naming: DestinationNaming::default(),
            selector: SelectorOptions::default(),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl CropConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(ConfigError::ZeroTarget {
                width: self.target_width,
                height: self.target_height,
            });
        }
        if self.quality > MAX_QUALITY {
            return Err(ConfigError::QualityOutOfRange(self.quality));
        }
        if self.naming.writes_into_source_bucket() {
            return Err(ConfigError::SourceBucketNaming);
        }
        if self.io_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
