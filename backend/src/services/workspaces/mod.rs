//! # Workspace Service Module
//!
//! HTTP surface of the workspace configuration engine, mounted under
//! `/api/workspaces`. Every route requires the caller's principal in the
//! `X-Principal-Id` header; all but creation also require that principal to own
//! the workspace.
//!
//! ## Sub-modules:
//! - `create`: creates an empty workspace owned by the caller.
//! - `get`: returns the persisted configuration of a workspace.
//! - `update`: reconciles the workspace against a desired configuration.
//! - `archive_status`: reports the template archive state of a requirement.

mod archive_status;
mod create;
mod get;
mod update;

pub use create::create_workspace;
pub use get::load_workspace_view;

use crate::error::ReconcileError;
use crate::store::workspaces;
use actix_web::web::{get, post, put, scope};
use actix_web::Scope;
use docket_common::model::workspace::Workspace;
use rusqlite::Connection;

/// The base path for all workspace API endpoints.
const API_PATH: &str = "/api/workspaces";

/// Singular path under which existing clients issue the reconciliation call.
const RECONCILE_ALIAS_PATH: &str = "/workspace";

/// Configures and returns the Actix `Scope` for workspace routes.
///
/// # Registered Routes:
///
/// *   **`POST /`**: `create::process`. Body `CreateWorkspaceRequest`; answers
///     `201 { workspaceId }`.
/// *   **`GET /{workspace_id}`**: `get::process`. Answers `200 WorkspaceView`.
/// *   **`PUT /{workspace_id}`**: `update::process`. Body `UpdateWorkspaceRequest`;
///     answers `200 { workspaceId }` once committed, or `409` with the full
///     conflict report when removals are blocked by submissions and `force` is unset.
/// *   **`GET /{workspace_id}/requirements/{requirement_id}/archive`**:
///     `archive_status::process`. Answers `200 ArchiveStatusResponse`.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("/{workspace_id}", get().to(get::process))
        .route("/{workspace_id}", put().to(update::process))
        .route(
            "/{workspace_id}/requirements/{requirement_id}/archive",
            get().to(archive_status::process),
        )
}

/// Mounts `PUT /workspace/{workspace_id}`, the same handler as
/// `PUT /api/workspaces/{workspace_id}`.
pub fn configure_alias_routes() -> Scope {
    scope(RECONCILE_ALIAS_PATH).route("/{workspace_id}", put().to(update::process))
}

/// Loads a workspace and checks that `principal` owns it.
fn owned_workspace(conn: &Connection, workspace_id: &str, principal: &str) -> Result<Workspace, ReconcileError> {
    let workspace = workspaces::find(conn, workspace_id)?
        .ok_or_else(|| ReconcileError::WorkspaceNotFound(workspace_id.to_string()))?;
    if workspace.owner_id != principal {
        return Err(ReconcileError::Unauthorized);
    }
    Ok(workspace)
}
