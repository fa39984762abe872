//! In-process object store.
//!
//! Holds objects in a map and records every call it receives, which lets
//! tests assert exactly which storage operations a pipeline run performed.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{StorageClient, StorageError};
use crate::location::ObjectLocation;

/// A call received by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Fetch(ObjectLocation),
    Put { location: ObjectLocation, len: usize },
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<ObjectLocation, Vec<u8>>>,
    calls: Mutex<Vec<StorageCall>>,
    put_failure: Mutex<Option<StorageError>>,
    latency: Mutex<Option<Duration>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, location: ObjectLocation, bytes: Vec<u8>) -> Self {
        self.insert(location, bytes);
        self
    }

    pub fn insert(&self, location: ObjectLocation, bytes: Vec<u8>) {
        lock(&self.objects).insert(location, bytes);
    }

    pub fn object(&self, location: &ObjectLocation) -> Option<Vec<u8>> {
        lock(&self.objects).get(location).cloned()
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<StorageCall> {
        lock(&self.calls).clone()
    }

    pub fn put_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, StorageCall::Put { .. }))
            .count()
    }

    /// Make every subsequent `put` fail with `error`.
    pub fn fail_puts_with(&self, error: StorageError) {
        *lock(&self.put_failure) = Some(error);
    }

    /// Delay every subsequent call by `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = Some(latency);
    }

    async fn simulate_latency(&self) {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, StorageError> {
        lock(&self.calls).push(StorageCall::Fetch(location.clone()));
        self.simulate_latency().await;

        self.object(location)
            .ok_or_else(|| StorageError::NotFound(location.clone()))
    }

    async fn put(&self, location: &ObjectLocation, bytes: Vec<u8>) -> Result<String, StorageError> {
        lock(&self.calls).push(StorageCall::Put {
            location: location.clone(),
            len: bytes.len(),
        });
        self.simulate_latency().await;

        let failure = lock(&self.put_failure).clone();
        if let Some(error) = failure {
            return Err(error);
        }
        self.insert(location.clone(), bytes);
        Ok(format!("memory://{}/{}", location.bucket, location.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_and_put() {
        let source = ObjectLocation::new("in", "a.jpg");
        let dest = ObjectLocation::new("out", "a.jpg");
        let storage = MemoryStorage::new().with_object(source.clone(), vec![1, 2, 3]);

        assert_eq!(storage.fetch(&source).await, Ok(vec![1, 2, 3]));
        assert_eq!(storage.put(&dest, vec![9]).await, Ok("memory://out/a.jpg".to_string()));
        assert_eq!(storage.object(&dest), Some(vec![9]));
        assert_eq!(
            storage.calls(),
            vec![
                StorageCall::Fetch(source),
                StorageCall::Put { location: dest, len: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_object() {
        let storage = MemoryStorage::new();
        let missing = ObjectLocation::new("in", "nope.jpg");

        assert_eq!(
            storage.fetch(&missing).await,
            Err(StorageError::NotFound(missing.clone()))
        );
    }

    #[tokio::test]
    async fn test_put_failure() {
        let storage = MemoryStorage::new();
        storage.fail_puts_with(StorageError::Backend("denied".into()));
        let dest = ObjectLocation::new("out", "a.jpg");

        assert!(storage.put(&dest, vec![1]).await.is_err());
        assert_eq!(storage.object(&dest), None);
        assert_eq!(storage.put_count(), 1);
    }
}
