use serde::{Deserialize, Serialize};

/// State of the most recent archive rebuild for one requirement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveJobStatus {
    Pending,
    InProgress,
    /// Carries the content id of the new archive.
    Completed(String),
    /// The rebuild had nothing to bundle (fewer than two templates, or the requirement is gone).
    Skipped(String),
    Failed(String),
}
