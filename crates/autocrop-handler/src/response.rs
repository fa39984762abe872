//! JSON written to stdout at the end of an invocation.

use autocrop_core::{CropResult, ObjectLocation, PipelineError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropResponse {
    pub success: bool,
    pub cropped_image_url: String,
}

impl From<&CropResult> for CropResponse {
    fn from(result: &CropResult) -> Self {
        Self {
            success: result.success,
            cropped_image_url: result.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Pipeline stage name, or `event` when the trigger payload was rejected.
    pub stage: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                stage: stage.into(),
                message: message.into(),
            },
        }
    }
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        Self::new(err.stage().as_str(), err.to_string())
    }
}

/// What `--dry-run` prints instead of touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunResponse {
    pub success: bool,
    pub source: ObjectLocation,
    pub destination: ObjectLocation,
    pub target_width: u32,
    pub target_height: u32,
}
