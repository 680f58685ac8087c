//! Derived template archives.
//!
//! A requirement with two or more templates gets one bundle of all of them so a
//! participant can download everything at once. The bundle is derived state: it
//! is rebuilt after the configuration commits and may briefly lag behind it.
//! When a rebuild fails the pointer stays null and clients fall back to
//! per-file downloads.

mod encoder;

pub use encoder::{ArchiveEncoder, ArchiveEntry, ZipEncoder};

use crate::config::ArchiveLimits;
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::reconcile::MIN_ARCHIVE_FILES;
use crate::store::{requirements, Database, StoreUnavailable};
use docket_common::model::requirement::TemplateFile;
use futures_util::future::join_all;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("fetching template {content_id} timed out after {timeout:?}")]
    FetchTimeout { content_id: String, timeout: Duration },
    #[error("fetching template {content_id} failed: {source}")]
    Fetch {
        content_id: String,
        #[source]
        source: ObjectStoreError,
    },
    #[error("templates add up to more than the {limit} byte archive ceiling")]
    SizeLimitExceeded { limit: u64 },
    #[error("archive encoding failed: {0}")]
    Encode(#[from] std::io::Error),
    #[error("storing archive failed: {0}")]
    Store(#[source] ObjectStoreError),
    #[error("archive bookkeeping failed: {0}")]
    Persistence(String),
}

impl From<rusqlite::Error> for ArchiveError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<StoreUnavailable> for ArchiveError {
    fn from(err: StoreUnavailable) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// A bundle was stored and the requirement now points at it.
    Built(String),
    /// Fewer than two templates; the pointer is null.
    Cleared,
    /// The requirement no longer exists.
    Missing,
    /// The template list changed while building; a newer rebuild owns the pointer.
    Superseded,
}

#[derive(Clone)]
pub struct ArchiveManager {
    db: Database,
    store: Arc<dyn ObjectStore>,
    encoder: Arc<dyn ArchiveEncoder>,
    limits: ArchiveLimits,
}

impl ArchiveManager {
    pub fn new(
        db: Database,
        store: Arc<dyn ObjectStore>,
        encoder: Arc<dyn ArchiveEncoder>,
        limits: ArchiveLimits,
    ) -> Self {
        Self {
            db,
            store,
            encoder,
            limits,
        }
    }

    /// Brings the requirement's archive in line with its current template list.
    /// Running it again for an unchanged list keeps the current content id.
    pub async fn rebuild_if_needed(&self, requirement_id: &str) -> Result<RebuildOutcome, ArchiveError> {
        let id = requirement_id.to_string();
        let requirement = self
            .db
            .run(move |conn| requirements::find(conn, &id).map_err(ArchiveError::from))
            .await?;
        let Some(requirement) = requirement else {
            debug!("requirement {} vanished before its archive rebuild", requirement_id);
            return Ok(RebuildOutcome::Missing);
        };

        if requirement.templates.len() < MIN_ARCHIVE_FILES {
            let templates = requirement.templates.clone();
            let id = requirement.id.clone();
            self.db
                .run(move |conn| {
                    requirements::set_archive_if_templates_match(conn, &id, &templates, None)
                        .map_err(ArchiveError::from)
                })
                .await?;
            return Ok(RebuildOutcome::Cleared);
        }

        // Reconciliation clears the pointer whenever the file set changes, so one that
        // is still set was built from the current list.
        if let Some(current) = &requirement.archive_content_id {
            debug!("requirement {} archive {} is current", requirement.id, current);
            return Ok(RebuildOutcome::Built(current.clone()));
        }

        let blobs = self.fetch_all(&requirement.templates).await?;
        let names = unique_entry_names(requirement.templates.iter().map(|t| t.display_name.as_str()));
        let entries: Vec<ArchiveEntry> = names
            .into_iter()
            .zip(blobs)
            .map(|(name, bytes)| ArchiveEntry { name, bytes })
            .collect();

        let encoder = Arc::clone(&self.encoder);
        let bytes = tokio::task::spawn_blocking(move || encoder.encode(&entries))
            .await
            .map_err(|e| ArchiveError::Persistence(format!("archive task failed: {e}")))??;

        let key = archive_key(
            &requirement.workspace_id,
            &requirement.id,
            &bytes,
            self.encoder.extension(),
        );
        let content_id = self.store.put(&key, bytes).await.map_err(ArchiveError::Store)?;

        let templates = requirement.templates.clone();
        let id = requirement.id.clone();
        let pointer = content_id.clone();
        let written = self
            .db
            .run(move |conn| {
                requirements::set_archive_if_templates_match(conn, &id, &templates, Some(&pointer))
                    .map_err(ArchiveError::from)
            })
            .await?;
        if !written {
            info!(
                "requirement {} changed or was bundled concurrently, discarding archive {}",
                requirement.id, content_id
            );
            if let Err(e) = self.store.delete(&content_id).await {
                warn!("failed to discard superseded archive {}: {}", content_id, e);
            }
            return Ok(RebuildOutcome::Superseded);
        }
        info!("requirement {} archive is now {}", requirement.id, content_id);
        Ok(RebuildOutcome::Built(content_id))
    }

    /// Fetches every template concurrently, each under the per-fetch timeout, and
    /// enforces the aggregate size ceiling.
    async fn fetch_all(&self, templates: &[TemplateFile]) -> Result<Vec<Vec<u8>>, ArchiveError> {
        let timeout = self.limits.fetch_timeout;
        let fetches = templates.iter().map(|t| async move {
            match tokio::time::timeout(timeout, self.store.get(&t.content_id)).await {
                Ok(Ok(bytes)) => Ok(bytes),
                Ok(Err(source)) => Err(ArchiveError::Fetch {
                    content_id: t.content_id.clone(),
                    source,
                }),
                Err(_) => Err(ArchiveError::FetchTimeout {
                    content_id: t.content_id.clone(),
                    timeout,
                }),
            }
        });

        let blobs = join_all(fetches).await.into_iter().collect::<Result<Vec<_>, _>>()?;
        let total: u64 = blobs.iter().map(|b| b.len() as u64).sum();
        if total > self.limits.max_total_bytes {
            return Err(ArchiveError::SizeLimitExceeded {
                limit: self.limits.max_total_bytes,
            });
        }
        Ok(blobs)
    }
}

/// Storage key of an archive: scoped by workspace and requirement, carrying the
/// digest of its bytes and a per-build suffix. A blob queued for purge by an older
/// pass can never share its key with a newer build of the same file set.
pub fn archive_key(workspace_id: &str, requirement_id: &str, bytes: &[u8], extension: &str) -> String {
    let mut hasher = md5::Context::new();
    hasher.consume(bytes);
    let digest = hasher.finalize();
    let build = uuid::Uuid::new_v4().simple();
    format!("archives/{workspace_id}/{requirement_id}-{digest:x}-{build}.{extension}")
}

/// Makes display names usable as entry names and unique in first-seen order:
/// a repeated `guide.pdf` becomes `guide (2).pdf`, then `guide (3).pdf`.
pub fn unique_entry_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used = HashSet::new();
    let mut out = Vec::new();
    for raw in names {
        let name = sanitize_entry_name(raw);
        let unique = if used.contains(&name) {
            let (stem, ext) = split_extension(&name);
            (2..)
                .map(|n| format!("{stem} ({n}){ext}"))
                .find(|candidate| !used.contains(candidate))
                .unwrap_or_default()
        } else {
            name
        };
        used.insert(unique.clone());
        out.push(unique);
    }
    out
}

fn sanitize_entry_name(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}
