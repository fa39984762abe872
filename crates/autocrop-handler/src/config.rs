use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use autocrop_core::{ConfigError, CropConfig};
use thiserror::Error;

pub const TARGET_WIDTH_VAR: &str = "AUTOCROP_TARGET_WIDTH";
pub const TARGET_HEIGHT_VAR: &str = "AUTOCROP_TARGET_HEIGHT";
pub const QUALITY_VAR: &str = "AUTOCROP_QUALITY";
pub const BUCKET_PREFIX_VAR: &str = "AUTOCROP_BUCKET_PREFIX";
pub const KEY_PREFIX_VAR: &str = "AUTOCROP_KEY_PREFIX";
pub const IO_TIMEOUT_VAR: &str = "AUTOCROP_IO_TIMEOUT_SECS";
pub const SEARCH_STEP_VAR: &str = "AUTOCROP_SEARCH_STEP";
pub const S3_ENDPOINT_VAR: &str = "AUTOCROP_S3_ENDPOINT";

#[derive(Debug, Error)]
pub enum EnvConfigError {
    #[error("{var}={value:?} is not valid: {reason}")]
    Unparseable {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be at least 1")]
    NotPositive(&'static str),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Handler settings read from the environment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandlerConfig {
    pub crop: CropConfig,
    /// Custom S3-compatible endpoint, e.g. a local MinIO. Path-style
    /// addressing is used when set.
    pub s3_endpoint: Option<String>,
}

impl HandlerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, EnvConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup`. Unset variables keep their
    /// defaults; set but unparseable ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnvConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut crop = CropConfig::default();

        if let Some(width) = parse_var(&lookup, TARGET_WIDTH_VAR)? {
            crop.target_width = width;
        }
        if let Some(height) = parse_var(&lookup, TARGET_HEIGHT_VAR)? {
            crop.target_height = height;
        }
        if let Some(quality) = parse_var(&lookup, QUALITY_VAR)? {
            crop.quality = quality;
        }
        if let Some(prefix) = lookup(BUCKET_PREFIX_VAR) {
            crop.naming.bucket_prefix = prefix;
        }
        if let Some(prefix) = lookup(KEY_PREFIX_VAR) {
            crop.naming.key_prefix = prefix;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, IO_TIMEOUT_VAR)? {
            crop.io_timeout = Duration::from_secs(secs);
        }
        if let Some(step) = parse_var::<u32, _>(&lookup, SEARCH_STEP_VAR)? {
            if step == 0 {
                return Err(EnvConfigError::NotPositive(SEARCH_STEP_VAR));
            }
            crop.selector.search_step = step;
        }

        crop.validate()?;

        let s3_endpoint = lookup(S3_ENDPOINT_VAR).filter(|endpoint| !endpoint.is_empty());
        Ok(Self { crop, s3_endpoint })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, EnvConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|err: T::Err| EnvConfigError::Unparseable {
            var,
            reason: err.to_string(),
            value,
        })
}
