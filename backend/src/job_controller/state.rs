//! Tracks the archive rebuilds started after reconciliations.
//!
//! Rebuilds run as detached tasks, outside the request that triggered them. Their
//! progress is kept here, keyed by requirement id, so the organizer can see
//! whether the bundle for a requirement is ready, skipped, or failed.
//!
//! The main components are:
//! - `JobsState`: a clonable, thread-safe handle on the status map plus the sender
//!   side of the update channel. It lives in the Actix application state.
//! - `JobUpdate`: a message carrying a new status for one requirement.
//! - `start_job_updater`: a long-running task draining the update channel into
//!   the status map.

use docket_common::jobs::ArchiveJobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for the state of all archive jobs.
#[derive(Clone)]
pub struct JobsState {
    /// Latest known status per requirement id.
    pub jobs: Arc<RwLock<HashMap<String, ArchiveJobStatus>>>,

    /// Producers (the post-commit runner) push progress through this sender
    /// without taking the write lock themselves.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    pub async fn status(&self, requirement_id: &str) -> Option<ArchiveJobStatus> {
        self.jobs.read().await.get(requirement_id).cloned()
    }
}

/// A status update for the archive job of one requirement.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) requirement_id: String,
    pub(crate) status: ArchiveJobStatus,
}

/// Starts the central job state updater task.
///
/// Spawn it once at startup. Updates only touch jobs the runner registered, so a
/// late message cannot resurrect the status of a removed requirement, and progress
/// that arrives after a final status is dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        let Some(current) = jobs.get_mut(&update.requirement_id) else {
            continue;
        };
        let finished = matches!(
            current,
            ArchiveJobStatus::Completed(_) | ArchiveJobStatus::Skipped(_) | ArchiveJobStatus::Failed(_)
        );
        if finished && update.status == ArchiveJobStatus::InProgress {
            continue;
        }
        *current = update.status;
    }
}
