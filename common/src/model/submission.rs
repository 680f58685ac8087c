use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub participant_id: String,
    pub requirement_id: String,
    pub content_id: String,
    pub filename: String,
    pub size: u64,
}
