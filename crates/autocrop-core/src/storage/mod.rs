//! Object-store contract consumed by the pipeline.
//!
//! The pipeline only needs two calls, `fetch` and `put`. Every call it makes
//! is wrapped in [`guarded`], which gives up when the caller's cancellation
//! token fires or the per-call timeout elapses, so a stuck network call never
//! holds an invocation open.

mod memory;

pub use memory::{MemoryStorage, StorageCall};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::location::ObjectLocation;

/// Failure reported by a storage client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("object {0} does not exist")]
    NotFound(ObjectLocation),

    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("storage call cancelled")]
    Cancelled,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Object-store access by bucket and key.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Read the whole object.
    async fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, StorageError>;

    /// Write `bytes` as the object, returning a descriptor of where it landed.
    async fn put(&self, location: &ObjectLocation, bytes: Vec<u8>) -> Result<String, StorageError>;
}

#[async_trait]
impl<T: StorageClient + ?Sized> StorageClient for Arc<T> {
    async fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, StorageError> {
        (**self).fetch(location).await
    }

    async fn put(&self, location: &ObjectLocation, bytes: Vec<u8>) -> Result<String, StorageError> {
        (**self).put(location, bytes).await
    }
}

/// Run a storage call, bounded by `timeout` and `cancel`.
///
/// A token that is already cancelled wins before the call is first polled.
pub async fn guarded<T, F>(
    call: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StorageError::Cancelled),
        outcome = tokio::time::timeout(timeout, call) => match outcome {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(timeout)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guarded_passes_result_through() {
        let cancel = CancellationToken::new();
        let result = guarded(async { Ok(7) }, Duration::from_secs(1), &cancel).await;
        assert_eq!(result, Ok(7));

        let result: Result<(), _> = guarded(
            async { Err(StorageError::Backend("boom".into())) },
            Duration::from_secs(1),
            &cancel,
        )
        .await;
        assert_eq!(result, Err(StorageError::Backend("boom".into())));
    }

    #[tokio::test]
    async fn test_guarded_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = guarded(async { Ok(1) }, Duration::from_secs(1), &cancel).await;
        assert_eq!(result, Err(StorageError::Cancelled));
    }

    #[tokio::test]
    async fn test_guarded_cancelled_while_waiting() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result: Result<(), _> =
            guarded(std::future::pending(), Duration::from_secs(30), &cancel).await;
        assert_eq!(result, Err(StorageError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_times_out() {
        let cancel = CancellationToken::new();
        let result: Result<(), _> =
            guarded(std::future::pending(), Duration::from_secs(5), &cancel).await;
        assert_eq!(result, Err(StorageError::Timeout(Duration::from_secs(5))));
    }
}
