//! Amazon S3 storage client.

use async_trait::async_trait;
use autocrop_core::{ObjectLocation, StorageClient, StorageError};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration (environment,
    /// profile or instance role). A custom `endpoint` switches to path-style
    /// addressing for S3-compatible stores.
    pub async fn connect(endpoint: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(endpoint) = endpoint {
            info!(endpoint, "using custom S3 endpoint");
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let config = S3ConfigBuilder::from(&shared)
            .force_path_style(endpoint.is_some())
            .build();
        Self::new(Client::from_conf(config))
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_no_such_key() {
                    StorageError::NotFound(location.clone())
                } else {
                    StorageError::Backend(DisplayErrorContext(&err).to_string())
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|err| StorageError::Backend(format!("reading {location}: {err}")))?;
        let bytes = body.into_bytes().to_vec();
        debug!(%location, bytes = bytes.len(), "downloaded object");
        Ok(bytes)
    }

    async fn put(&self, location: &ObjectLocation, bytes: Vec<u8>) -> Result<String, StorageError> {
        let len = bytes.len();
        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .content_type(JPEG_CONTENT_TYPE)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| StorageError::Backend(DisplayErrorContext(&err).to_string()))?;

        debug!(%location, bytes = len, "uploaded object");
        Ok(location.to_string())
    }
}
