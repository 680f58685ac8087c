//! Pairs desired items with persisted ones.
//!
//! Explicit ids are resolved first across the whole desired list, then the email
//! fallback runs over whatever is still unmatched. An existing item is matched at
//! most once. An email shared by several unmatched existing items matches none of
//! them.

use docket_common::model::participant::Participant;
use docket_common::model::requirement::RequirementSpec;
use docket_common::requests::{DesiredParticipant, DesiredRequirement};

/// Keys an item can be matched by.
pub trait Identity {
    fn id(&self) -> Option<&str>;

    /// Natural key; only participants have one.
    fn email(&self) -> Option<&str> {
        None
    }
}

impl Identity for Participant {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

impl Identity for DesiredParticipant {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

impl Identity for RequirementSpec {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl Identity for DesiredRequirement {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug)]
pub struct MatchOutcome<'d, 'e, D, E> {
    /// Every desired item in input order, with its existing counterpart if any.
    pub pairs: Vec<(&'d D, Option<&'e E>)>,
    /// Existing items nobody claimed: the removal candidates.
    pub unmatched: Vec<&'e E>,
}

pub fn match_items<'d, 'e, D, E>(
    existing: &'e [E],
    desired: &'d [D],
    by_email: bool,
) -> MatchOutcome<'d, 'e, D, E>
where
    D: Identity,
    E: Identity,
{
    let mut taken = vec![false; existing.len()];
    let mut assigned: Vec<Option<usize>> = vec![None; desired.len()];

    for (slot, item) in assigned.iter_mut().zip(desired) {
        let Some(id) = item.id().filter(|id| !id.is_empty()) else {
            continue;
        };
        if let Some(idx) = existing
            .iter()
            .enumerate()
            .position(|(i, e)| !taken[i] && e.id() == Some(id))
        {
            taken[idx] = true;
            *slot = Some(idx);
        }
    }

    if by_email {
        for (slot, item) in assigned.iter_mut().zip(desired) {
            if slot.is_some() {
                continue;
            }
            let Some(email) = item.email().map(normalize_email).filter(|e| !e.is_empty()) else {
                continue;
            };
            let mut candidates = existing.iter().enumerate().filter(|(i, e)| {
                !taken[*i] && e.email().map(normalize_email).as_deref() == Some(email.as_str())
            });
            let first = candidates.next().map(|(i, _)| i);
            let ambiguous = candidates.next().is_some();
            if let (Some(idx), false) = (first, ambiguous) {
                taken[idx] = true;
                *slot = Some(idx);
            }
        }
    }

    MatchOutcome {
        pairs: desired
            .iter()
            .zip(&assigned)
            .map(|(d, slot)| (d, slot.map(|i| &existing[i])))
            .collect(),
        unmatched: existing
            .iter()
            .zip(&taken)
            .filter(|(_, taken)| !**taken)
            .map(|(e, _)| e)
            .collect(),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
