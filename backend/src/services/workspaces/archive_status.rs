use super::owned_workspace;
use crate::auth::Principal;
use crate::error::ReconcileError;
use crate::state::AppState;
use crate::store::requirements;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use docket_common::responses::ArchiveStatusResponse;

pub async fn process(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (workspace_id, requirement_id) = path.into_inner();
    match archive_status(&state, &principal.0, workspace_id, requirement_id).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => e.error_response(),
    }
}

async fn archive_status(
    state: &AppState,
    principal: &str,
    workspace_id: String,
    requirement_id: String,
) -> Result<ArchiveStatusResponse, ReconcileError> {
    let principal = principal.to_string();
    let id = requirement_id.clone();
    let requirement = state
        .db
        .run(move |conn| {
            owned_workspace(conn, &workspace_id, &principal)?;
            requirements::find(conn, &id)?
                .filter(|r| r.workspace_id == workspace_id)
                .ok_or_else(|| ReconcileError::RequirementNotFound(id.clone()))
        })
        .await?;

    Ok(ArchiveStatusResponse {
        job: state.jobs.status(&requirement_id).await,
        requirement_id,
        archive_content_id: requirement.archive_content_id,
    })
}
