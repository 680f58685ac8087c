//! Work that must only happen after a reconciliation committed.
//!
//! The transaction returns its hooks as plain data; the caller dispatches them
//! once the commit succeeded. Each hook runs in its own task and handles its own
//! failure, so nothing here can report a committed change as failed.

use crate::archive::{ArchiveManager, RebuildOutcome};
use crate::cleanup::CleanupExecutor;
use crate::job_controller::state::{JobUpdate, JobsState};
use docket_common::jobs::ArchiveJobStatus;
use log::{debug, error, warn};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCommitHook {
    /// Delete blobs no longer referenced by committed state.
    PurgeBlobs(Vec<String>),
    /// Rebuild (or clear) the template archive of a requirement.
    RebuildArchive { requirement_id: String },
    /// Drop archive job statuses of requirements that no longer exist.
    ForgetArchiveJobs(Vec<String>),
}

#[derive(Clone)]
pub struct PostCommitRunner {
    cleanup: CleanupExecutor,
    archives: ArchiveManager,
    jobs: JobsState,
}

impl PostCommitRunner {
    pub fn new(cleanup: CleanupExecutor, archives: ArchiveManager, jobs: JobsState) -> Self {
        Self {
            cleanup,
            archives,
            jobs,
        }
    }

    /// Spawns every hook independently and returns their handles.
    pub fn dispatch(&self, hooks: Vec<PostCommitHook>) -> Vec<JoinHandle<()>> {
        hooks
            .into_iter()
            .map(|hook| {
                let runner = self.clone();
                tokio::spawn(async move { runner.run(hook).await })
            })
            .collect()
    }

    async fn run(&self, hook: PostCommitHook) {
        match hook {
            PostCommitHook::PurgeBlobs(content_ids) => {
                let requested = content_ids.len();
                let summary = self.cleanup.purge(content_ids).await;
                if summary.failed > 0 {
                    warn!(
                        "blob cleanup left {} of {} blobs behind",
                        summary.failed, requested
                    );
                } else {
                    debug!("blob cleanup removed {} blobs", summary.deleted);
                }
            }
            PostCommitHook::RebuildArchive { requirement_id } => self.rebuild(requirement_id).await,
            PostCommitHook::ForgetArchiveJobs(requirement_ids) => {
                let mut jobs = self.jobs.jobs.write().await;
                for id in &requirement_ids {
                    jobs.remove(id);
                }
            }
        }
    }

    async fn rebuild(&self, requirement_id: String) {
        self.jobs
            .jobs
            .write()
            .await
            .insert(requirement_id.clone(), ArchiveJobStatus::Pending);
        if self
            .jobs
            .tx
            .try_send(JobUpdate {
                requirement_id: requirement_id.clone(),
                status: ArchiveJobStatus::InProgress,
            })
            .is_err()
        {
            debug!("job update channel unavailable for requirement {}", requirement_id);
        }

        let status = match self.archives.rebuild_if_needed(&requirement_id).await {
            Ok(RebuildOutcome::Built(content_id)) => ArchiveJobStatus::Completed(content_id),
            Ok(RebuildOutcome::Cleared) => {
                ArchiveJobStatus::Skipped("fewer than two templates".to_string())
            }
            Ok(RebuildOutcome::Missing) => {
                self.jobs.jobs.write().await.remove(&requirement_id);
                return;
            }
            Ok(RebuildOutcome::Superseded) => {
                ArchiveJobStatus::Skipped("superseded by a newer template list".to_string())
            }
            Err(e) => {
                error!("archive rebuild for requirement {} failed: {}", requirement_id, e);
                ArchiveJobStatus::Failed(e.to_string())
            }
        };
        self.jobs.jobs.write().await.insert(requirement_id, status);
    }
}
