use crate::model::requirement::TemplateFile;
use crate::model::workspace::ReminderConfig;
use serde::{Deserialize, Serialize};

/// Body of `PUT /api/workspaces/{id}`: the complete desired configuration.
///
/// Participants and requirements absent from the lists are removal candidates.
/// `deadline` stays a string so an unparseable date is reported as invalid input
/// by the reconciler instead of being rejected by the JSON extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkspaceRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub participants: Vec<DesiredParticipant>,
    #[serde(default)]
    pub requirements: Vec<DesiredRequirement>,
    pub deadline: String,
    #[serde(default)]
    pub reminder_config: Option<ReminderConfig>,
    /// Authorizes cascading deletion of items that have submissions.
    #[serde(default)]
    pub force: bool,
    /// Confirms moving a closed workspace back to `reopened`.
    #[serde(default)]
    pub reopen: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredParticipant {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredRequirement {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub allow_multiple_files: bool,
    #[serde(default)]
    pub templates: Vec<TemplateFile>,
}

fn default_required() -> bool {
    true
}

/// Body of `POST /api/workspaces`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub deadline: String,
}
