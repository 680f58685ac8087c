//! Blob storage collaborator.
//!
//! Content ids are opaque to the rest of the service: the store assigns one on
//! `put` and the same value is handed back to `get` and `delete`. Both bundled
//! implementations use the object key itself as the content id, so callers that
//! want a fresh identity per content put the content digest in the key.

mod fs;
mod memory;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

use async_trait::async_trait;
use std::path::{Component, Path};

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("blob {0} not found")]
    NotFound(String),
    #[error("invalid object key {0:?}")]
    InvalidKey(String),
    #[error("object store i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, content_id: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Stores `bytes` under `key` and returns the content id of the stored blob.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, ObjectStoreError>;

    /// Removes a blob. Deleting an absent blob succeeds.
    async fn delete(&self, content_id: &str) -> Result<(), ObjectStoreError>;
}

/// Accepts relative, slash-separated keys without `..`, `.` or empty segments.
pub(crate) fn validate_key(key: &str) -> Result<(), ObjectStoreError> {
    let invalid = || ObjectStoreError::InvalidKey(key.to_string());
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(invalid());
    }
    if key.split('/').any(|segment| segment.is_empty()) {
        return Err(invalid());
    }
    if Path::new(key)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(invalid());
    }
    Ok(())
}
