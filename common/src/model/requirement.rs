use serde::{Deserialize, Serialize};

/// A downloadable template attached to a requirement.
///
/// `content_id` is the storage-assigned blob key; it alone decides whether two
/// template lists hold the same files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFile {
    pub content_id: String,
    pub display_name: String,
}

/// One requested document type within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSpec {
    pub id: String,
    pub workspace_id: String,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub allow_multiple_files: bool,
    pub templates: Vec<TemplateFile>,
    /// Content id of the bundled archive of `templates`, when one has been built.
    pub archive_content_id: Option<String>,
}
