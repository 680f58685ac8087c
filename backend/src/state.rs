use crate::archive::{ArchiveManager, ZipEncoder};
use crate::cleanup::CleanupExecutor;
use crate::config::AppConfig;
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::object_store::ObjectStore;
use crate::post_commit::PostCommitRunner;
use crate::reconcile::Reconciler;
use crate::store::Database;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shared application state, injected into every handler as `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub reconciler: Reconciler,
    pub jobs: JobsState,
}

impl AppState {
    /// Wires the engine together. The returned receiver must be handed to
    /// `start_job_updater`.
    pub fn new(
        db: Database,
        store: Arc<dyn ObjectStore>,
        config: &AppConfig,
    ) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (jobs, rx) = JobsState::new(100);
        let archives = ArchiveManager::new(
            db.clone(),
            Arc::clone(&store),
            Arc::new(ZipEncoder),
            config.archive,
        );
        let runner = PostCommitRunner::new(CleanupExecutor::new(store), archives, jobs.clone());
        let reconciler = Reconciler::new(db.clone(), runner, config.match_by_email);
        (
            Self {
                db,
                reconciler,
                jobs,
            },
            rx,
        )
    }
}
