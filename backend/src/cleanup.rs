//! Deferred blob removal after a committed reconciliation.

use crate::object_store::ObjectStore;
use futures_util::future::join_all;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct CleanupExecutor {
    store: Arc<dyn ObjectStore>,
}

impl CleanupExecutor {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Deletes every distinct blob concurrently. A failed deletion is logged and
    /// does not affect the others; an orphaned blob only costs storage.
    pub async fn purge(&self, content_ids: Vec<String>) -> PurgeSummary {
        let unique: BTreeSet<String> = content_ids.into_iter().filter(|id| !id.is_empty()).collect();
        let deletions = unique.iter().map(|id| async move {
            match self.store.delete(id).await {
                Ok(()) => {
                    debug!("purged blob {}", id);
                    true
                }
                Err(e) => {
                    warn!("failed to purge blob {}: {}", id, e);
                    false
                }
            }
        });

        let results = join_all(deletions).await;
        let deleted = results.iter().filter(|ok| **ok).count();
        PurgeSummary {
            deleted,
            failed: results.len() - deleted,
        }
    }
}
