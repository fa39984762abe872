//! Autocrop Handler - storage-notification entry point
//!
//! Turns a trigger payload into a crop request, runs it through the core
//! pipeline and shapes the JSON response.
//!
//! # Module Structure
//!
//! - `config` - environment-driven settings
//! - `event` - S3 notifications and direct records
//! - `response` - success, failure and dry-run JSON bodies
//! - `s3` - `StorageClient` backed by Amazon S3

pub mod config;
pub mod event;
pub mod response;
pub mod s3;

pub use config::{EnvConfigError, HandlerConfig};
pub use event::{parse_request, EventError, Notification};
pub use response::{CropResponse, DryRunResponse, ErrorResponse};
pub use s3::S3Storage;

use autocrop_core::{CropConfig, CropPipeline, StorageClient};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Stage name reported when the payload itself is rejected.
pub const EVENT_STAGE: &str = "event";

/// Handle one trigger payload end to end.
pub async fn handle_notification<S: StorageClient>(
    pipeline: &CropPipeline<S>,
    payload: &str,
    cancel: &CancellationToken,
) -> Result<CropResponse, ErrorResponse> {
    let request = parse_request(payload).map_err(|err| {
        warn!(error = %err, "rejected notification");
        ErrorResponse::new(EVENT_STAGE, err.to_string())
    })?;

    pipeline
        .run(request, cancel)
        .await
        .map(|result| CropResponse::from(&result))
        .map_err(|err| ErrorResponse::from(&err))
}

/// Describe what `payload` would do without touching storage.
pub fn dry_run(config: &CropConfig, payload: &str) -> Result<DryRunResponse, ErrorResponse> {
    let request =
        parse_request(payload).map_err(|err| ErrorResponse::new(EVENT_STAGE, err.to_string()))?;
    Ok(DryRunResponse {
        success: true,
        destination: config.naming.destination_for(&request.source),
        source: request.source,
        target_width: config.target_width,
        target_height: config.target_height,
    })
}
