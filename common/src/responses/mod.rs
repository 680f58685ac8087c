use crate::jobs::ArchiveJobStatus;
use crate::model::participant::Participant;
use crate::model::requirement::RequirementSpec;
use crate::model::workspace::Workspace;
use serde::{Deserialize, Serialize};

/// Error code carried by every 409 produced by a blocked reconciliation.
pub const CONFLICT_WITH_SUBMISSIONS: &str = "CONFLICT_WITH_SUBMISSIONS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceIdResponse {
    pub workspace_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResponse {
    pub code: String,
    pub conflict_participants: Vec<String>,
    pub conflict_requirements: Vec<String>,
}

/// Body of every non-conflict error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Persisted configuration of a workspace as returned by `GET /api/workspaces/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceView {
    pub workspace: Workspace,
    pub participants: Vec<Participant>,
    pub requirements: Vec<RequirementSpec>,
}

/// Archive state of one requirement as returned by
/// `GET /api/workspaces/{id}/requirements/{rid}/archive`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveStatusResponse {
    pub requirement_id: String,
    pub archive_content_id: Option<String>,
    /// Latest rebuild job since the service started, if any ran.
    pub job: Option<ArchiveJobStatus>,
}
