//! Crop pipeline orchestration.
//!
//! Drives one [`ImageJob`] through fetch, decode, region selection, encode
//! and upload. Stages run strictly in order and the first failure ends the
//! run: no later stage executes and no storage call follows it.

mod error;
mod job;

pub use error::{PipelineError, Stage};
pub use job::{ImageJob, JobStatus};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConfigError, CropConfig};
use crate::location::ObjectLocation;
use crate::storage::StorageClient;
use crate::transform::CropRect;

/// The object whose upload triggered this invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRequest {
    pub source: ObjectLocation,
}

impl CropRequest {
    pub fn new(source: ObjectLocation) -> Self {
        Self { source }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropResult {
    pub destination: ObjectLocation,
    /// Location descriptor returned by the storage client.
    pub location: String,
    pub success: bool,
    pub crop: CropRect,
    pub bytes_written: usize,
}

/// A storage client plus a validated configuration.
#[derive(Debug)]
pub struct CropPipeline<S> {
    storage: S,
    config: CropConfig,
}

impl<S: StorageClient> CropPipeline<S> {
    pub fn new(storage: S, config: CropConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { storage, config })
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Where a crop of `source` would be written.
    pub fn destination_for(&self, source: &ObjectLocation) -> ObjectLocation {
        self.config.naming.destination_for(source)
    }

    /// Run one job to completion or to its first failure.
    #[tracing::instrument(
        name = "crop_job",
        skip_all,
        fields(bucket = %request.source.bucket, key = %request.source.key)
    )]
    pub async fn run(
        &self,
        request: CropRequest,
        cancel: &CancellationToken,
    ) -> Result<CropResult, PipelineError> {
        let mut job = ImageJob::new(request.source, &self.config.naming);

        match self.drive(&mut job, cancel).await {
            Ok(result) => {
                info!(
                    destination = %result.destination,
                    bytes = result.bytes_written,
                    "crop uploaded"
                );
                Ok(result)
            }
            Err(err) => {
                warn!(stage = %err.stage(), error = %err, "crop job failed");
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        job: &mut ImageJob,
        cancel: &CancellationToken,
    ) -> Result<CropResult, PipelineError> {
        let timeout = self.config.io_timeout;

        job.fetch(&self.storage, timeout, cancel).await?;
        let (width, height) = job.decode()?;
        let crop = job.select_region(
            self.config.target_width,
            self.config.target_height,
            &self.config.selector,
        )?;
        info!(%crop, width, height, "crop region chosen");
        job.encode(self.config.quality)?;
        job.upload(&self.storage, timeout, cancel).await
    }
}
