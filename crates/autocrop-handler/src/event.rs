//! Trigger payloads.
//!
//! Two shapes are accepted: an S3 object-created notification, and a direct
//! record naming the source bucket and key. Only the first S3 record is
//! processed.

use std::borrow::Cow;

use autocrop_core::{CropRequest, ObjectLocation};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed notification: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("notification carries no records")]
    NoRecords,

    #[error("notification names an empty bucket or key")]
    EmptyLocation,

    #[error("object key {0:?} is not valid UTF-8 once decoded")]
    InvalidKey(String),
}

/// A parsed trigger payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Notification {
    S3(S3Event),
    Direct(DirectRecord),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Object {
    /// URL-encoded, with spaces as `+`.
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectRecord {
    pub source_bucket: String,
    pub source_key: String,
}

impl Notification {
    pub fn parse(payload: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// The crop request this notification asks for.
    pub fn into_request(self) -> Result<CropRequest, EventError> {
        let source = match self {
            Notification::S3(event) => {
                let total = event.records.len();
                let record = event
                    .records
                    .into_iter()
                    .next()
                    .ok_or(EventError::NoRecords)?;
                if total > 1 {
                    warn!(
                        records = total,
                        "notification has several records, processing only the first"
                    );
                }
                let key = decode_object_key(&record.s3.object.key)?;
                ObjectLocation::new(record.s3.bucket.name, key)
            }
            Notification::Direct(record) => {
                ObjectLocation::new(record.source_bucket, record.source_key)
            }
        };

        if source.bucket.is_empty() || source.key.is_empty() {
            return Err(EventError::EmptyLocation);
        }
        Ok(CropRequest::new(source))
    }
}

/// Undo the form encoding S3 applies to object keys in notifications.
pub fn decode_object_key(raw: &str) -> Result<String, EventError> {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| EventError::InvalidKey(raw.to_string()))
}

/// Parse a payload straight into a request.
pub fn parse_request(payload: &str) -> Result<CropRequest, EventError> {
    Notification::parse(payload)?.into_request()
}
