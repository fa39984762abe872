//! Per-invocation job state.
//!
//! An [`ImageJob`] moves through
//! `Created -> Fetched -> Decoded -> RegionSelected -> Encoded -> Uploaded`,
//! or into `Failed` the moment a stage reports an error. Each state carries
//! only the data later stages need. Once failed, every stage call returns
//! the stored error and changes nothing.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{CropResult, PipelineError, Stage};
use crate::decode::{decode_jpeg, DecodedImage};
use crate::encode::render_and_encode;
use crate::location::{DestinationNaming, ObjectLocation};
use crate::region::{select_crop_region_with, RegionError, SelectorOptions};
use crate::storage::{guarded, StorageClient};
use crate::transform::CropRect;

/// Data-free view of a job's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Fetched,
    Decoded,
    RegionSelected,
    Encoded,
    Uploaded,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Created => "created",
            JobStatus::Fetched => "fetched",
            JobStatus::Decoded => "decoded",
            JobStatus::RegionSelected => "region_selected",
            JobStatus::Encoded => "encoded",
            JobStatus::Uploaded => "uploaded",
            JobStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
enum JobState {
    Created,
    Fetched {
        raw: Vec<u8>,
    },
    Decoded {
        raster: DecodedImage,
    },
    RegionSelected {
        raster: DecodedImage,
        crop: CropRect,
    },
    Encoded {
        crop: CropRect,
        output: Vec<u8>,
    },
    Uploaded(CropResult),
    Failed(PipelineError),
}

impl JobState {
    fn status(&self) -> JobStatus {
        match self {
            JobState::Created => JobStatus::Created,
            JobState::Fetched { .. } => JobStatus::Fetched,
            JobState::Decoded { .. } => JobStatus::Decoded,
            JobState::RegionSelected { .. } => JobStatus::RegionSelected,
            JobState::Encoded { .. } => JobStatus::Encoded,
            JobState::Uploaded(_) => JobStatus::Uploaded,
            JobState::Failed(_) => JobStatus::Failed,
        }
    }
}

/// One image moving through the pipeline.
#[derive(Debug)]
pub struct ImageJob {
    source: ObjectLocation,
    destination: ObjectLocation,
    state: JobState,
}

impl ImageJob {
    /// Create a job for `source`; the destination is derived here, once.
    pub fn new(source: ObjectLocation, naming: &DestinationNaming) -> Self {
        let destination = naming.destination_for(&source);
        Self {
            source,
            destination,
            state: JobState::Created,
        }
    }

    pub fn source(&self) -> &ObjectLocation {
        &self.source
    }

    pub fn destination(&self) -> &ObjectLocation {
        &self.destination
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match &self.state {
            JobState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn crop(&self) -> Option<CropRect> {
        match &self.state {
            JobState::RegionSelected { crop, .. } | JobState::Encoded { crop, .. } => Some(*crop),
            JobState::Uploaded(result) => Some(result.crop),
            _ => None,
        }
    }

    /// The outcome of a completed upload.
    pub fn result(&self) -> Option<&CropResult> {
        match &self.state {
            JobState::Uploaded(result) => Some(result),
            _ => None,
        }
    }

    /// Encoded output, available between encode and upload.
    pub fn output(&self) -> Option<&[u8]> {
        match &self.state {
            JobState::Encoded { output, .. } => Some(output),
            _ => None,
        }
    }

    /// `Created -> Fetched`. Returns the number of bytes read.
    pub async fn fetch<S>(
        &mut self,
        storage: &S,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<usize, PipelineError>
    where
        S: StorageClient + ?Sized,
    {
        match self.begin()? {
            JobState::Created => {}
            other => return Err(self.out_of_order(Stage::Fetch, other)),
        }

        match guarded(storage.fetch(&self.source), timeout, cancel).await {
            Ok(raw) => {
                let len = raw.len();
                debug!(bytes = len, "fetched source object");
                self.state = JobState::Fetched { raw };
                Ok(len)
            }
            Err(cause) => {
                let location = self.source.clone();
                Err(self.fail(PipelineError::Fetch { location, cause }))
            }
        }
    }

    /// `Fetched -> Decoded`. The raw bytes are released once decoded.
    pub fn decode(&mut self) -> Result<(u32, u32), PipelineError> {
        let raw = match self.begin()? {
            JobState::Fetched { raw } => raw,
            other => return Err(self.out_of_order(Stage::Decode, other)),
        };

        match decode_jpeg(&raw) {
            Ok(raster) => {
                let dims = (raster.width, raster.height);
                debug!(width = dims.0, height = dims.1, "decoded source image");
                self.state = JobState::Decoded { raster };
                Ok(dims)
            }
            Err(cause) => {
                let location = self.source.clone();
                Err(self.fail(PipelineError::Decode { location, cause }))
            }
        }
    }

    /// `Decoded -> RegionSelected`.
    pub fn select_region(
        &mut self,
        target_width: u32,
        target_height: u32,
        options: &SelectorOptions,
    ) -> Result<CropRect, PipelineError> {
        let raster = match self.begin()? {
            JobState::Decoded { raster } => raster,
            other => return Err(self.out_of_order(Stage::SelectRegion, other)),
        };

        let selected = select_crop_region_with(&raster, target_width, target_height, options)
            .and_then(|crop| {
                if crop.fits_within(raster.width, raster.height) {
                    Ok(crop)
                } else {
                    Err(RegionError::AspectUnsatisfiable {
                        target_width,
                        target_height,
                        image_width: raster.width,
                        image_height: raster.height,
                    })
                }
            });

        match selected {
            Ok(crop) => {
                debug!(%crop, "selected crop region");
                self.state = JobState::RegionSelected { raster, crop };
                Ok(crop)
            }
            Err(cause) => {
                let location = self.source.clone();
                Err(self.fail(PipelineError::NoValidRegion {
                    location,
                    target_width,
                    target_height,
                    cause,
                }))
            }
        }
    }

    /// `RegionSelected -> Encoded`. Returns the encoded size.
    pub fn encode(&mut self, quality: u8) -> Result<usize, PipelineError> {
        let (raster, crop) = match self.begin()? {
            JobState::RegionSelected { raster, crop } => (raster, crop),
            other => return Err(self.out_of_order(Stage::Encode, other)),
        };

        match render_and_encode(&raster, crop, quality) {
            Ok(output) => {
                let len = output.len();
                debug!(bytes = len, quality, "encoded crop");
                self.state = JobState::Encoded { crop, output };
                Ok(len)
            }
            Err(cause) => {
                let location = self.source.clone();
                Err(self.fail(PipelineError::Encode { location, cause }))
            }
        }
    }

    /// `Encoded -> Uploaded`.
    pub async fn upload<S>(
        &mut self,
        storage: &S,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<CropResult, PipelineError>
    where
        S: StorageClient + ?Sized,
    {
        let (crop, output) = match self.begin()? {
            JobState::Encoded { crop, output } => (crop, output),
            other => return Err(self.out_of_order(Stage::Upload, other)),
        };

        let bytes_written = output.len();
        match guarded(storage.put(&self.destination, output), timeout, cancel).await {
            Ok(location) => {
                debug!(%location, bytes = bytes_written, "uploaded crop");
                let result = CropResult {
                    destination: self.destination.clone(),
                    location,
                    success: true,
                    crop,
                    bytes_written,
                };
                self.state = JobState::Uploaded(result.clone());
                Ok(result)
            }
            Err(cause) => {
                let location = self.destination.clone();
                Err(self.fail(PipelineError::Upload { location, cause }))
            }
        }
    }

    /// Take the current state for a stage to consume, or re-report the
    /// stored failure.
    fn begin(&mut self) -> Result<JobState, PipelineError> {
        if let JobState::Failed(err) = &self.state {
            return Err(err.clone());
        }
        Ok(std::mem::replace(&mut self.state, JobState::Created))
    }

    /// Put back a state that `stage` cannot consume.
    fn out_of_order(&mut self, stage: Stage, state: JobState) -> PipelineError {
        let status = state.status();
        self.state = state;
        PipelineError::OutOfOrder { stage, status }
    }

    fn fail(&mut self, err: PipelineError) -> PipelineError {
        self.state = JobState::Failed(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_jpeg;
    use crate::storage::{MemoryStorage, StorageCall, StorageError};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let pixels: Vec<u8> = (0..(width * height * 3) as usize)
            .map(|i| ((i * 7) % 256) as u8)
            .collect();
        encode_jpeg(&pixels, width, height, 90).unwrap()
    }

    fn source() -> ObjectLocation {
        ObjectLocation::new("photos", "cat.jpg")
    }

    fn new_job() -> ImageJob {
        ImageJob::new(source(), &DestinationNaming::default())
    }

    #[test]
    fn test_destination_derived_at_creation() {
        let job = new_job();
        assert_eq!(job.destination(), &ObjectLocation::new("resized-photos", "cat.jpg"));
        assert_eq!(job.status(), JobStatus::Created);
        assert_eq!(job.crop(), None);
    }

    #[tokio::test]
    async fn test_stages_advance_in_order() {
        let storage = MemoryStorage::new().with_object(source(), jpeg(40, 30));
        let cancel = CancellationToken::new();
        let mut job = new_job();

        job.fetch(&storage, TIMEOUT, &cancel).await.unwrap();
        assert_eq!(job.status(), JobStatus::Fetched);

        assert_eq!(job.decode().unwrap(), (40, 30));
        assert_eq!(job.status(), JobStatus::Decoded);

        let crop = job.select_region(20, 20, &SelectorOptions::default()).unwrap();
        assert_eq!((crop.width, crop.height), (20, 20));
        assert_eq!(job.crop(), Some(crop));

        let len = job.encode(100).unwrap();
        assert_eq!(job.output().map(<[u8]>::len), Some(len));

        assert_eq!(job.result(), None);
        let result = job.upload(&storage, TIMEOUT, &cancel).await.unwrap();
        assert_eq!(job.status(), JobStatus::Uploaded);
        assert_eq!(job.result(), Some(&result));
        assert_eq!(job.crop(), Some(crop));
        assert_eq!(result.location, "memory://resized-photos/cat.jpg");
        assert_eq!(result.bytes_written, len);
        assert_eq!(result.destination, ObjectLocation::new("resized-photos", "cat.jpg"));
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_failed_job_rereports_error() {
        let storage = MemoryStorage::new().with_object(source(), b"not an image".to_vec());
        let cancel = CancellationToken::new();
        let mut job = new_job();

        job.fetch(&storage, TIMEOUT, &cancel).await.unwrap();
        let err = job.decode().unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
        assert_eq!(job.status(), JobStatus::Failed);

        // Every later stage reports the same error and touches nothing
        assert_eq!(job.select_region(10, 10, &SelectorOptions::default()), Err(err.clone()));
        assert_eq!(job.encode(100), Err(err.clone()));
        assert_eq!(job.upload(&storage, TIMEOUT, &cancel).await.unwrap_err(), err);
        assert_eq!(job.fetch(&storage, TIMEOUT, &cancel).await, Err(err.clone()));
        assert_eq!(job.error(), Some(&err));

        assert_eq!(storage.calls(), vec![StorageCall::Fetch(source())]);
    }

    #[tokio::test]
    async fn test_out_of_order_call_keeps_state() {
        let storage = MemoryStorage::new().with_object(source(), jpeg(8, 8));
        let cancel = CancellationToken::new();
        let mut job = new_job();

        assert_eq!(
            job.encode(100),
            Err(PipelineError::OutOfOrder {
                stage: Stage::Encode,
                status: JobStatus::Created,
            })
        );
        assert_eq!(job.status(), JobStatus::Created);

        job.fetch(&storage, TIMEOUT, &cancel).await.unwrap();
        assert!(matches!(
            job.fetch(&storage, TIMEOUT, &cancel).await,
            Err(PipelineError::OutOfOrder { stage: Stage::Fetch, status: JobStatus::Fetched })
        ));
        // Still decodable after the misuse
        assert!(job.decode().is_ok());
    }

    #[tokio::test]
    async fn test_upload_failure_wraps_destination() {
        let storage = MemoryStorage::new().with_object(source(), jpeg(16, 16));
        storage.fail_puts_with(StorageError::Backend("access denied".into()));
        let cancel = CancellationToken::new();
        let mut job = new_job();

        job.fetch(&storage, TIMEOUT, &cancel).await.unwrap();
        job.decode().unwrap();
        job.select_region(8, 8, &SelectorOptions::default()).unwrap();
        job.encode(80).unwrap();

        let err = job.upload(&storage, TIMEOUT, &cancel).await.unwrap_err();
        assert_eq!(
            err,
            PipelineError::Upload {
                location: ObjectLocation::new("resized-photos", "cat.jpg"),
                cause: StorageError::Backend("access denied".into()),
            }
        );
        assert_eq!(job.output(), None);
        assert_eq!(job.result(), None);
    }
}
