//! Template-set comparison and the archive bookkeeping that follows from it.

use docket_common::model::requirement::{RequirementSpec, TemplateFile};
use std::collections::BTreeSet;

/// Archives are only built for requirements with at least this many templates.
pub const MIN_ARCHIVE_FILES: usize = 2;

pub fn content_ids(templates: &[TemplateFile]) -> BTreeSet<&str> {
    templates.iter().map(|t| t.content_id.as_str()).collect()
}

/// What reconciliation does to one requirement's archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePlan {
    /// Value written to the requirement's archive pointer in this transaction.
    pub archive_content_id: Option<String>,
    /// Queue a rebuild once the transaction commits.
    pub rebuild: bool,
    /// Former archive blob, now unreferenced.
    pub stale_archive: Option<String>,
    /// Template blobs that left the set.
    pub orphaned: Vec<String>,
}

/// Plans the archive for a requirement about to be written with `desired` templates.
/// `previous` is the persisted row when the requirement was matched.
///
/// A change is decided on content ids as a set: reordering or renaming files keeps
/// the current archive.
pub fn plan_archive(previous: Option<&RequirementSpec>, desired: &[TemplateFile]) -> ArchivePlan {
    let bundle = desired.len() >= MIN_ARCHIVE_FILES;
    let Some(previous) = previous else {
        return ArchivePlan {
            archive_content_id: None,
            rebuild: bundle,
            stale_archive: None,
            orphaned: Vec::new(),
        };
    };

    let before = content_ids(&previous.templates);
    let after = content_ids(desired);
    let orphaned = before.difference(&after).map(|id| id.to_string()).collect();

    if !bundle {
        return ArchivePlan {
            archive_content_id: None,
            rebuild: false,
            stale_archive: previous.archive_content_id.clone(),
            orphaned,
        };
    }
    if before != after {
        return ArchivePlan {
            archive_content_id: None,
            rebuild: true,
            stale_archive: previous.archive_content_id.clone(),
            orphaned,
        };
    }
    ArchivePlan {
        archive_content_id: previous.archive_content_id.clone(),
        rebuild: previous.archive_content_id.is_none(),
        stale_archive: None,
        orphaned,
    }
}
