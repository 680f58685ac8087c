//! `PUT /api/workspaces/{workspace_id}`: the reconciliation entry point.
//!
//! The response is sent as soon as the transaction committed; blob cleanup and
//! archive rebuilds keep running in the background.

use crate::auth::Principal;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use docket_common::requests::UpdateWorkspaceRequest;
use docket_common::responses::WorkspaceIdResponse;

pub async fn process(
    state: web::Data<AppState>,
    principal: Principal,
    workspace_id: web::Path<String>,
    payload: web::Json<UpdateWorkspaceRequest>,
) -> impl Responder {
    match state
        .reconciler
        .apply(&principal.0, &workspace_id, payload.into_inner())
        .await
    {
        Ok(applied) => HttpResponse::Ok().json(WorkspaceIdResponse {
            workspace_id: applied.workspace_id,
        }),
        Err(e) => e.error_response(),
    }
}
