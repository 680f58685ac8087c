use crate::auth::Principal;
use crate::error::ReconcileError;
use crate::reconcile::{parse_deadline, require_title};
use crate::state::AppState;
use crate::store::{workspaces, Database};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use docket_common::model::workspace::{ReminderConfig, Workspace, WorkspaceStatus};
use docket_common::requests::CreateWorkspaceRequest;
use docket_common::responses::WorkspaceIdResponse;
use log::info;

pub async fn process(
    state: web::Data<AppState>,
    principal: Principal,
    payload: web::Json<CreateWorkspaceRequest>,
) -> impl Responder {
    match create_workspace(&state.db, &principal.0, payload.into_inner()).await {
        Ok(workspace_id) => HttpResponse::Created().json(WorkspaceIdResponse { workspace_id }),
        Err(e) => e.error_response(),
    }
}

/// Creates an empty, open workspace owned by `owner_id` and returns its id.
/// Participants and requirements are added afterwards through reconciliation.
pub async fn create_workspace(
    db: &Database,
    owner_id: &str,
    req: CreateWorkspaceRequest,
) -> Result<String, ReconcileError> {
    require_title(&req.title)?;
    let deadline = parse_deadline(&req.deadline)?;

    let workspace = Workspace {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        title: req.title.trim().to_string(),
        description: req.description.filter(|d| !d.trim().is_empty()),
        deadline,
        status: WorkspaceStatus::Open,
        reminder_config: ReminderConfig::default(),
    };
    let id = workspace.id.clone();
    db.run(move |conn| workspaces::insert(conn, &workspace).map_err(ReconcileError::from))
        .await?;
    info!("workspace {} created by {}", id, owner_id);
    Ok(id)
}
