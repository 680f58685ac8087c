use serde::{Deserialize, Serialize};

/// One expected submitter of a workspace.
///
/// `email` is the natural key used when a caller does not carry the participant id.
/// Uniqueness within a workspace is not enforced by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub user_id: Option<String>,
}
