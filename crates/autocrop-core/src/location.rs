//! Object locations and the source-to-destination naming rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bucket/key pair in an object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Derives where a cropped image is written from where its source was read.
///
/// destination bucket = `bucket_prefix + source.bucket`
/// destination key    = `key_prefix + source.key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationNaming {
    pub bucket_prefix: String,
    pub key_prefix: String,
}

impl Default for DestinationNaming {
    fn default() -> Self {
        Self {
            bucket_prefix: "resized-".to_string(),
            key_prefix: String::new(),
        }
    }
}

impl DestinationNaming {
    pub fn destination_for(&self, source: &ObjectLocation) -> ObjectLocation {
        ObjectLocation {
            bucket: format!("{}{}", self.bucket_prefix, source.bucket),
            key: format!("{}{}", self.key_prefix, source.key),
        }
    }

    /// True if crops land in the bucket they were read from. A trigger on
    /// that bucket would fire again for every crop written.
    pub fn writes_into_source_bucket(&self) -> bool {
        self.bucket_prefix.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_naming_prefixes_bucket() {
        let naming = DestinationNaming::default();
        let dest = naming.destination_for(&ObjectLocation::new("photos", "2024/cat.jpg"));

        assert_eq!(dest, ObjectLocation::new("resized-photos", "2024/cat.jpg"));
    }

    #[test]
    fn test_key_prefix() {
        let naming = DestinationNaming {
            bucket_prefix: String::new(),
            key_prefix: "cropped/".to_string(),
        };
        let dest = naming.destination_for(&ObjectLocation::new("photos", "cat.jpg"));

        assert_eq!(dest, ObjectLocation::new("photos", "cropped/cat.jpg"));
        // A key prefix alone still writes into the watched bucket
        assert!(naming.writes_into_source_bucket());
    }

    #[test]
    fn test_derivation_is_stable() {
        let naming = DestinationNaming::default();
        let source = ObjectLocation::new("b", "k");
        assert_eq!(naming.destination_for(&source), naming.destination_for(&source));
    }

    #[test]
    fn test_source_bucket_naming_detected() {
        let naming = DestinationNaming {
            bucket_prefix: String::new(),
            key_prefix: String::new(),
        };
        assert!(naming.writes_into_source_bucket());
        assert!(!DestinationNaming::default().writes_into_source_bucket());

        let keyed = DestinationNaming {
            bucket_prefix: "resized-".to_string(),
            key_prefix: "thumbs/".to_string(),
        };
        assert!(!keyed.writes_into_source_bucket());
    }

    #[test]
    fn test_display() {
        assert_eq!(ObjectLocation::new("b", "a/b.jpg").to_string(), "s3://b/a/b.jpg");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: The default rule never maps a location onto itself.
        #[test]
        fn prop_default_never_overwrites_source(bucket in "[a-z0-9.-]{1,20}", key in ".{0,40}") {
            let source = ObjectLocation::new(bucket.clone(), key.clone());
            let dest = DestinationNaming::default().destination_for(&source);

            prop_assert_ne!(&dest, &source);
            prop_assert_eq!(dest.key, key);
            prop_assert_eq!(dest.bucket, format!("resized-{}", bucket));
        }
    }
}
