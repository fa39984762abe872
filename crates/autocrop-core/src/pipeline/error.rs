//! Pipeline failures.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::JobStatus;
use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::location::ObjectLocation;
use crate::region::RegionError;
use crate::storage::StorageError;

/// The pipeline step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Decode,
    SelectRegion,
    Encode,
    Upload,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Decode => "decode",
            Stage::SelectRegion => "select_region",
            Stage::Encode => "encode",
            Stage::Upload => "upload",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first failure of a crop job.
///
/// Each variant names the object involved and wraps the collaborator's error
/// as its source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("failed to fetch {location}: {cause}")]
    Fetch {
        location: ObjectLocation,
        #[source]
        cause: StorageError,
    },

    #[error("failed to decode {location}: {cause}")]
    Decode {
        location: ObjectLocation,
        #[source]
        cause: DecodeError,
    },

    #[error("no valid {target_width}x{target_height} crop region in {location}: {cause}")]
    NoValidRegion {
        location: ObjectLocation,
        target_width: u32,
        target_height: u32,
        #[source]
        cause: RegionError,
    },

    #[error("failed to encode crop of {location}: {cause}")]
    Encode {
        location: ObjectLocation,
        #[source]
        cause: EncodeError,
    },

    #[error("failed to upload {location}: {cause}")]
    Upload {
        location: ObjectLocation,
        #[source]
        cause: StorageError,
    },

    #[error("{stage} stage called while job is {status}")]
    OutOfOrder { stage: Stage, status: JobStatus },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Fetch { .. } => Stage::Fetch,
            PipelineError::Decode { .. } => Stage::Decode,
            PipelineError::NoValidRegion { .. } => Stage::SelectRegion,
            PipelineError::Encode { .. } => Stage::Encode,
            PipelineError::Upload { .. } => Stage::Upload,
            PipelineError::OutOfOrder { stage, .. } => *stage,
        }
    }

    /// The object the failing stage was working on.
    pub fn location(&self) -> Option<&ObjectLocation> {
        match self {
            PipelineError::Fetch { location, .. }
            | PipelineError::Decode { location, .. }
            | PipelineError::NoValidRegion { location, .. }
            | PipelineError::Encode { location, .. }
            | PipelineError::Upload { location, .. } => Some(location),
            PipelineError::OutOfOrder { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_includes_location_and_cause() {
        let location = ObjectLocation::new("photos", "cat.jpg");
        let err = PipelineError::Fetch {
            location: location.clone(),
            cause: StorageError::NotFound(location),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch s3://photos/cat.jpg: object s3://photos/cat.jpg does not exist"
        );
        assert_eq!(err.stage(), Stage::Fetch);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::SelectRegion.to_string(), "select_region");
        let err = PipelineError::OutOfOrder {
            stage: Stage::Encode,
            status: JobStatus::Fetched,
        };
        assert_eq!(err.stage(), Stage::Encode);
        assert_eq!(err.location(), None);
        assert_eq!(err.to_string(), "encode stage called while job is fetched");
    }
}
