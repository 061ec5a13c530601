//! Local blob store trait.
//!
//! A synchronous string-keyed blob store on the device, the equivalent of
//! browser local storage. It is the whole source of truth for guests and a
//! resiliency mirror for signed-in identities.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use parley_types::error::StoreError;

/// Synchronous string-keyed blob storage.
///
/// Implementations live in parley-infra (e.g., `FileBlobStore`); an
/// in-memory implementation is provided here for ephemeral use and tests.
pub trait BlobStore: Send + Sync {
    /// Get the blob stored under `key`. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous blob.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the blob under `key`. No-op if the key does not exist.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local blob store backed by a shared map.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.blobs
            .lock()
            .map_err(|_| StoreError::Unreachable("blob map lock poisoned".to_string()))
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
