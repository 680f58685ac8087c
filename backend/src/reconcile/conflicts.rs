//! Decides, for every removal candidate, whether it goes, cascades, or blocks.
//!
//! The whole candidate list is always evaluated, so a blocked pass reports every
//! conflicting item at once.

use super::dependencies::{DependencyChecker, RemovalCandidate};
use docket_common::model::conflict::ConflictReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub candidate: RemovalCandidate,
    /// Submissions exist and the caller authorized deleting them.
    pub cascade: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub report: ConflictReport,
    /// Candidates cleared for deletion. Blocked candidates are absent.
    pub removals: Vec<Removal>,
    /// Blob ids of submissions deleted by cascades.
    pub cleanup: Vec<String>,
}

impl Evaluation {
    pub fn merge(mut self, other: Evaluation) -> Evaluation {
        self.removals.extend(other.removals);
        self.cleanup.extend(other.cleanup);
        Evaluation {
            report: self.report.merge(other.report),
            removals: self.removals,
            cleanup: self.cleanup,
        }
    }
}

pub fn evaluate(
    candidates: &[RemovalCandidate],
    force: bool,
    deps: &impl DependencyChecker,
) -> rusqlite::Result<Evaluation> {
    let mut blocked_participants = Vec::new();
    let mut blocked_requirements = Vec::new();
    let mut removals = Vec::with_capacity(candidates.len());
    let mut cleanup = Vec::new();

    for candidate in candidates {
        let count = deps.dependents(candidate)?;
        if count == 0 {
            removals.push(Removal {
                candidate: candidate.clone(),
                cascade: false,
            });
            continue;
        }
        if force {
            cleanup.extend(deps.dependent_blobs(candidate)?);
            removals.push(Removal {
                candidate: candidate.clone(),
                cascade: true,
            });
            continue;
        }
        let name = candidate.display_name().to_string();
        let bucket = match candidate {
            RemovalCandidate::Participant { .. } => &mut blocked_participants,
            RemovalCandidate::Requirement { .. } => &mut blocked_requirements,
        };
        if !bucket.contains(&name) {
            bucket.push(name);
        }
    }

    Ok(Evaluation {
        report: ConflictReport {
            participants: blocked_participants,
            requirements: blocked_requirements,
        },
        removals,
        cleanup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(HashMap<String, Vec<String>>);

    impl DependencyChecker for Fixed {
        fn dependents(&self, candidate: &RemovalCandidate) -> rusqlite::Result<u64> {
            Ok(self.0.get(id_of(candidate)).map_or(0, |b| b.len() as u64))
        }

        fn dependent_blobs(&self, candidate: &RemovalCandidate) -> rusqlite::Result<Vec<String>> {
            Ok(self.0.get(id_of(candidate)).cloned().unwrap_or_default())
        }
    }

    fn id_of(candidate: &RemovalCandidate) -> &str {
        match candidate {
            RemovalCandidate::Participant { id, .. } | RemovalCandidate::Requirement { id, .. } => id,
        }
    }

    fn participant(id: &str, name: &str) -> RemovalCandidate {
        RemovalCandidate::Participant {
            id: id.into(),
            name: name.into(),
        }
    }

    fn requirement(id: &str, title: &str) -> RemovalCandidate {
        RemovalCandidate::Requirement {
            id: id.into(),
            title: title.into(),
            template_ids: vec![],
            archive_content_id: None,
        }
    }

    fn deps() -> Fixed {
        Fixed(
            [
                ("p2".to_string(), vec!["blob-1".to_string(), "blob-2".to_string()]),
                ("p3".to_string(), vec!["blob-3".to_string()]),
                ("r1".to_string(), vec!["blob-1".to_string()]),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn reports_every_blocked_item_without_force() {
        let candidates = vec![
            participant("p1", "A"),
            participant("p2", "B"),
            participant("p3", "C"),
            requirement("r1", "Passport"),
            requirement("r2", "Photo"),
        ];
        let eval = evaluate(&candidates, false, &deps()).unwrap();

        assert_eq!(eval.report.participants, vec!["B", "C"]);
        assert_eq!(eval.report.requirements, vec!["Passport"]);
        assert!(eval.cleanup.is_empty());
        let removed: Vec<_> = eval.removals.iter().map(|r| r.candidate.display_name()).collect();
        assert_eq!(removed, vec!["A", "Photo"]);
        assert!(eval.removals.iter().all(|r| !r.cascade));
    }

    #[test]
    fn force_turns_conflicts_into_cascades() {
        let candidates = vec![participant("p2", "B"), requirement("r2", "Photo")];
        let eval = evaluate(&candidates, true, &deps()).unwrap();

        assert!(eval.report.is_empty());
        assert_eq!(eval.cleanup, vec!["blob-1", "blob-2"]);
        assert!(eval.removals[0].cascade);
        assert!(!eval.removals[1].cascade);
    }

    #[test]
    fn merge_combines_both_phases() {
        let people = evaluate(&[participant("p2", "B")], false, &deps()).unwrap();
        let docs = evaluate(&[requirement("r1", "Passport")], false, &deps()).unwrap();
        let merged = people.merge(docs);
        assert_eq!(merged.report.participants, vec!["B"]);
        assert_eq!(merged.report.requirements, vec!["Passport"]);
    }
}
