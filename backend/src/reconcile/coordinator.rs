use super::conflicts;
use super::dependencies::{RemovalCandidate, TransactionDependencies};
use super::matcher::match_items;
use super::templates::plan_archive;
use super::validate::validate_update;
use crate::error::ReconcileError;
use crate::post_commit::PostCommitHook;
use crate::store::{participants, reminders, requirements, submissions, workspaces};
use chrono::{DateTime, Utc};
use docket_common::model::participant::Participant;
use docket_common::model::requirement::RequirementSpec;
use docket_common::model::workspace::{Workspace, WorkspaceStatus};
use docket_common::requests::UpdateWorkspaceRequest;
use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub principal: String,
    pub match_by_email: bool,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Removals that also deleted submissions.
    pub cascaded: usize,
}

/// A committed pass and the work it leaves for after the commit.
#[derive(Debug)]
pub struct Committed {
    pub workspace_id: String,
    pub hooks: Vec<PostCommitHook>,
    pub summary: ReconcileSummary,
}

/// Runs one reconciliation inside its own immediate transaction: commits on
/// success, rolls back on any error including a conflict.
pub fn apply_blocking(
    conn: &mut Connection,
    workspace_id: &str,
    desired: &UpdateWorkspaceRequest,
    opts: &ReconcileOptions,
) -> Result<Committed, ReconcileError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match reconcile_in_transaction(&tx, workspace_id, desired, opts) {
        Ok(committed) => {
            tx.commit()?;
            Ok(committed)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!("rollback of workspace {} failed: {}", workspace_id, rollback_err);
            }
            Err(err)
        }
    }
}

/// Applies `desired` to the workspace through `tx` without committing.
///
/// Every write happens before the conflict decision; a non-empty conflict report
/// is returned as an error so the caller discards the transaction.
pub fn reconcile_in_transaction(
    tx: &Transaction<'_>,
    workspace_id: &str,
    desired: &UpdateWorkspaceRequest,
    opts: &ReconcileOptions,
) -> Result<Committed, ReconcileError> {
    let mut workspace = workspaces::find(tx, workspace_id)?
        .ok_or_else(|| ReconcileError::WorkspaceNotFound(workspace_id.to_string()))?;
    if workspace.owner_id != opts.principal {
        return Err(ReconcileError::Unauthorized);
    }

    let deadline = validate_update(desired)?;
    workspace.status = next_status(&workspace, desired.reopen, deadline, opts.now)?;
    workspace.title = desired.title.trim().to_string();
    workspace.description = trimmed(&desired.description);
    workspace.deadline = deadline;
    if let Some(config) = &desired.reminder_config {
        workspace.reminder_config = config.clone();
    }
    workspaces::update(tx, &workspace)?;

    let deps = TransactionDependencies::new(tx);
    let mut summary = ReconcileSummary::default();

    let existing = participants::list_for_workspace(tx, workspace_id)?;
    let matched = match_items(&existing, &desired.participants, opts.match_by_email);
    for (position, (wanted, current)) in matched.pairs.iter().enumerate() {
        let row = Participant {
            id: current.map_or_else(new_id, |p| p.id.clone()),
            workspace_id: workspace_id.to_string(),
            name: wanted.name.trim().to_string(),
            email: trimmed(&wanted.email),
            phone: trimmed(&wanted.phone),
            user_id: trimmed(&wanted.user_id),
        };
        if current.is_some() {
            participants::update(tx, &row, position)?;
            summary.updated += 1;
        } else {
            participants::insert(tx, &row, position)?;
            summary.created += 1;
        }
    }
    let candidates: Vec<RemovalCandidate> = matched
        .unmatched
        .iter()
        .map(|p| RemovalCandidate::Participant {
            id: p.id.clone(),
            name: p.name.clone(),
        })
        .collect();
    let people = conflicts::evaluate(&candidates, desired.force, &deps)?;

    let mut rebuild = Vec::new();
    let mut orphaned = Vec::new();
    let existing = requirements::list_for_workspace(tx, workspace_id)?;
    let matched = match_items(&existing, &desired.requirements, false);
    for (position, (wanted, current)) in matched.pairs.iter().enumerate() {
        let plan = plan_archive(*current, &wanted.templates);
        let row = RequirementSpec {
            id: current.map_or_else(new_id, |r| r.id.clone()),
            workspace_id: workspace_id.to_string(),
            title: wanted.title.trim().to_string(),
            description: trimmed(&wanted.description),
            required: wanted.required,
            allow_multiple_files: wanted.allow_multiple_files,
            templates: wanted.templates.clone(),
            archive_content_id: plan.archive_content_id,
        };
        if current.is_some() {
            requirements::update(tx, &row, position)?;
            summary.updated += 1;
        } else {
            requirements::insert(tx, &row, position)?;
            summary.created += 1;
        }
        if plan.rebuild {
            rebuild.push(row.id);
        }
        orphaned.extend(plan.orphaned);
        orphaned.extend(plan.stale_archive);
    }
    let candidates: Vec<RemovalCandidate> = matched
        .unmatched
        .iter()
        .map(|r| RemovalCandidate::Requirement {
            id: r.id.clone(),
            title: r.title.clone(),
            template_ids: r.templates.iter().map(|t| t.content_id.clone()).collect(),
            archive_content_id: r.archive_content_id.clone(),
        })
        .collect();
    let documents = conflicts::evaluate(&candidates, desired.force, &deps)?;

    let evaluation = people.merge(documents);
    if !evaluation.report.is_empty() {
        return Err(ReconcileError::Conflict(evaluation.report));
    }

    let mut removed_requirements = Vec::new();
    for removal in &evaluation.removals {
        match &removal.candidate {
            RemovalCandidate::Participant { id, .. } => {
                if removal.cascade {
                    submissions::delete_for_participant(tx, id)?;
                }
                reminders::delete_for_participant(tx, id)?;
                participants::delete(tx, id)?;
            }
            RemovalCandidate::Requirement {
                id,
                template_ids,
                archive_content_id,
                ..
            } => {
                if removal.cascade {
                    submissions::delete_for_requirement(tx, id)?;
                }
                requirements::delete(tx, id)?;
                removed_requirements.push(id.clone());
                orphaned.extend(template_ids.iter().cloned());
                orphaned.extend(archive_content_id.iter().cloned());
            }
        }
        summary.removed += 1;
        if removal.cascade {
            summary.cascaded += 1;
        }
    }

    // Any blob may still be named by a requirement or a submission elsewhere in the store.
    let mut seen = BTreeSet::new();
    let mut purge = Vec::new();
    for id in evaluation.cleanup.into_iter().chain(orphaned) {
        if !seen.insert(id.clone()) {
            continue;
        }
        if requirements::references_blob(tx, &id)? || submissions::references_blob(tx, &id)? {
            debug!("blob {} is still referenced, keeping it", id);
            continue;
        }
        purge.push(id);
    }

    let mut hooks = Vec::with_capacity(rebuild.len() + 2);
    if !purge.is_empty() {
        hooks.push(PostCommitHook::PurgeBlobs(purge));
    }
    if !removed_requirements.is_empty() {
        hooks.push(PostCommitHook::ForgetArchiveJobs(removed_requirements));
    }
    hooks.extend(
        rebuild
            .into_iter()
            .map(|requirement_id| PostCommitHook::RebuildArchive { requirement_id }),
    );

    Ok(Committed {
        workspace_id: workspace.id,
        hooks,
        summary,
    })
}

fn next_status(
    workspace: &Workspace,
    reopen: bool,
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<WorkspaceStatus, ReconcileError> {
    if !reopen || !workspace.status.is_closed() {
        return Ok(workspace.status);
    }
    if deadline <= now {
        return Err(ReconcileError::InvalidInput(
            "reopening a workspace requires a deadline in the future".to_string(),
        ));
    }
    Ok(WorkspaceStatus::Reopened)
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
