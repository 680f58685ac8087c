//! Workspace configuration reconciliation.
//!
//! A pass matches the desired participants and requirements against the stored
//! ones, writes creates and updates, evaluates every implied removal against
//! existing submissions and either commits everything or nothing. Blob cleanup
//! and archive rebuilds are returned as post-commit hooks and dispatched only
//! after the commit succeeded.

mod conflicts;
mod coordinator;
mod dependencies;
mod matcher;
mod templates;
mod validate;

pub use conflicts::{evaluate, Evaluation, Removal};
pub use coordinator::{
    apply_blocking, reconcile_in_transaction, Committed, ReconcileOptions, ReconcileSummary,
};
pub use dependencies::{DependencyChecker, RemovalCandidate, TransactionDependencies};
pub use matcher::{match_items, Identity, MatchOutcome};
pub use templates::{plan_archive, ArchivePlan, MIN_ARCHIVE_FILES};
pub use validate::{parse_deadline, require_title, validate_update};

use crate::error::ReconcileError;
use crate::post_commit::PostCommitRunner;
use crate::store::Database;
use chrono::Utc;
use docket_common::requests::UpdateWorkspaceRequest;
use log::info;
use tokio::task::JoinHandle;

/// Result of a committed `apply`.
#[derive(Debug)]
pub struct Applied {
    pub workspace_id: String,
    pub summary: ReconcileSummary,
    /// Post-commit work already running. Dropping the handles detaches it.
    pub background: Vec<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct Reconciler {
    db: Database,
    hooks: PostCommitRunner,
    match_by_email: bool,
}

impl Reconciler {
    pub fn new(db: Database, hooks: PostCommitRunner, match_by_email: bool) -> Self {
        Self {
            db,
            hooks,
            match_by_email,
        }
    }

    pub async fn apply(
        &self,
        principal: &str,
        workspace_id: &str,
        desired: UpdateWorkspaceRequest,
    ) -> Result<Applied, ReconcileError> {
        let opts = ReconcileOptions {
            principal: principal.to_string(),
            match_by_email: self.match_by_email,
            now: Utc::now(),
        };
        let id = workspace_id.to_string();
        let result = self
            .db
            .run(move |conn| apply_blocking(conn, &id, &desired, &opts))
            .await;

        let committed = match result {
            Ok(committed) => committed,
            Err(ReconcileError::Conflict(report)) => {
                info!(
                    "workspace {} unchanged: {} participants and {} requirements blocked by submissions",
                    workspace_id,
                    report.participants.len(),
                    report.requirements.len()
                );
                return Err(ReconcileError::Conflict(report));
            }
            Err(err) => return Err(err),
        };

        let summary = committed.summary;
        info!(
            "workspace {} reconciled: {} created, {} updated, {} removed ({} with submissions), {} post-commit hooks",
            committed.workspace_id,
            summary.created,
            summary.updated,
            summary.removed,
            summary.cascaded,
            committed.hooks.len()
        );
        let background = self.hooks.dispatch(committed.hooks);
        Ok(Applied {
            workspace_id: committed.workspace_id,
            summary,
            background,
        })
    }
}
