use crate::store::submissions;
use rusqlite::Connection;

/// An existing item that the desired state no longer mentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalCandidate {
    Participant {
        id: String,
        name: String,
    },
    Requirement {
        id: String,
        title: String,
        template_ids: Vec<String>,
        archive_content_id: Option<String>,
    },
}

impl RemovalCandidate {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Participant { name, .. } => name,
            Self::Requirement { title, .. } => title,
        }
    }
}

/// Looks up submissions that depend on a removal candidate.
pub trait DependencyChecker {
    /// Number of submissions referencing the candidate; zero means safe to delete.
    fn dependents(&self, candidate: &RemovalCandidate) -> rusqlite::Result<u64>;

    /// Blob ids of those submissions, for cleanup after a forced cascade.
    fn dependent_blobs(&self, candidate: &RemovalCandidate) -> rusqlite::Result<Vec<String>>;
}

/// Reads through the connection of the open reconciliation transaction, so a
/// concurrent upload cannot land between the check and the delete.
pub struct TransactionDependencies<'c> {
    conn: &'c Connection,
}

impl<'c> TransactionDependencies<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl DependencyChecker for TransactionDependencies<'_> {
    fn dependents(&self, candidate: &RemovalCandidate) -> rusqlite::Result<u64> {
        match candidate {
            RemovalCandidate::Participant { id, .. } => submissions::count_for_participant(self.conn, id),
            RemovalCandidate::Requirement { id, .. } => submissions::count_for_requirement(self.conn, id),
        }
    }

    fn dependent_blobs(&self, candidate: &RemovalCandidate) -> rusqlite::Result<Vec<String>> {
        match candidate {
            RemovalCandidate::Participant { id, .. } => {
                submissions::content_ids_for_participant(self.conn, id)
            }
            RemovalCandidate::Requirement { id, .. } => {
                submissions::content_ids_for_requirement(self.conn, id)
            }
        }
    }
}
