use super::{validate_key, ObjectStore, ObjectStoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local object store. Selected with `DOCKET_OBJECT_STORE=memory`.
#[derive(Default)]
pub struct MemoryObjectStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, content_id: &str) -> bool {
        self.blobs.read().await.contains_key(content_id)
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, content_id: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.blobs
            .read()
            .await
            .get(content_id)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(content_id.to_string()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, ObjectStoreError> {
        validate_key(key)?;
        self.blobs.write().await.insert(key.to_string(), bytes);
        Ok(key.to_string())
    }

    async fn delete(&self, content_id: &str) -> Result<(), ObjectStoreError> {
        self.blobs.write().await.remove(content_id);
        Ok(())
    }
}
