use serde::{Deserialize, Serialize};

/// Removals blocked during one reconciliation pass because submissions depend on them.
///
/// Participants and requirements are kept apart so a caller can tell which side
/// of the configuration needs attention. Names keep discovery order and appear once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub participants: Vec<String>,
    pub requirements: Vec<String>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty() && self.requirements.is_empty()
    }

    /// Combines two partial reports, dropping names already present.
    pub fn merge(self, other: ConflictReport) -> ConflictReport {
        ConflictReport {
            participants: union(self.participants, other.participants),
            requirements: union(self.requirements, other.requirements),
        }
    }
}

fn union(mut left: Vec<String>, right: Vec<String>) -> Vec<String> {
    for name in right {
        if !left.contains(&name) {
            left.push(name);
        }
    }
    left
}
