use super::owned_workspace;
use crate::auth::Principal;
use crate::error::ReconcileError;
use crate::state::AppState;
use crate::store::{participants, requirements, Database};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use docket_common::responses::WorkspaceView;

pub async fn process(
    state: web::Data<AppState>,
    principal: Principal,
    workspace_id: web::Path<String>,
) -> impl Responder {
    match load_workspace_view(&state.db, &principal.0, &workspace_id).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => e.error_response(),
    }
}

/// Reads the workspace with its participants and requirements in stored order.
pub async fn load_workspace_view(
    db: &Database,
    principal: &str,
    workspace_id: &str,
) -> Result<WorkspaceView, ReconcileError> {
    let principal = principal.to_string();
    let workspace_id = workspace_id.to_string();
    db.run(move |conn| {
        let workspace = owned_workspace(conn, &workspace_id, &principal)?;
        Ok(WorkspaceView {
            participants: participants::list_for_workspace(conn, &workspace_id)?,
            requirements: requirements::list_for_workspace(conn, &workspace_id)?,
            workspace,
        })
    })
    .await
}
