use crate::store::StoreUnavailable;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use docket_common::model::conflict::ConflictReport;
use docket_common::responses::{ConflictResponse, ErrorResponse, CONFLICT_WITH_SUBMISSIONS};

/// Failure of a workspace operation.
///
/// Anything returned from inside the reconciliation transaction rolls the whole
/// transaction back, so none of these ever accompanies a partial commit.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("caller does not own this workspace")]
    Unauthorized,
    #[error("workspace {0} not found")]
    WorkspaceNotFound(String),
    #[error("requirement {0} not found")]
    RequirementNotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(
        "removal blocked by existing submissions ({} participants, {} requirements)",
        .0.participants.len(),
        .0.requirements.len()
    )]
    Conflict(ConflictReport),
    /// Transaction-level failure; nothing was committed and the call may be retried.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ReconcileError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "FORBIDDEN",
            Self::WorkspaceNotFound(_) | Self::RequirementNotFound(_) => "NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Conflict(_) => CONFLICT_WITH_SUBMISSIONS,
            Self::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }
}

impl From<rusqlite::Error> for ReconcileError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<StoreUnavailable> for ReconcileError {
    fn from(err: StoreUnavailable) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl ResponseError for ReconcileError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::WorkspaceNotFound(_) | Self::RequirementNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            Self::Conflict(report) => response.json(ConflictResponse {
                code: CONFLICT_WITH_SUBMISSIONS.to_string(),
                conflict_participants: report.participants.clone(),
                conflict_requirements: report.requirements.clone(),
            }),
            other => response.json(ErrorResponse {
                code: other.code().to_string(),
                message: other.to_string(),
            }),
        }
    }
}
