use crate::error::ReconcileError;
use chrono::{DateTime, Utc};
use docket_common::requests::UpdateWorkspaceRequest;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN));

pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, ReconcileError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| ReconcileError::InvalidInput(format!("deadline {raw:?} is not an RFC 3339 date: {e}")))
}

pub fn require_title(title: &str) -> Result<(), ReconcileError> {
    if title.trim().is_empty() {
        return Err(ReconcileError::InvalidInput("title must not be empty".to_string()));
    }
    Ok(())
}

/// Checks the shape of a desired configuration and returns its parsed deadline.
pub fn validate_update(req: &UpdateWorkspaceRequest) -> Result<DateTime<Utc>, ReconcileError> {
    require_title(&req.title)?;
    let deadline = parse_deadline(&req.deadline)?;

    let email_re = EMAIL_RE
        .as_ref()
        .map_err(|e| ReconcileError::Persistence(format!("email pattern: {e}")))?;
    let mut participant_ids = HashSet::new();
    for (idx, p) in req.participants.iter().enumerate() {
        if p.name.trim().is_empty() {
            return Err(ReconcileError::InvalidInput(format!("participant #{} has no name", idx + 1)));
        }
        if let Some(email) = p.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            if !email_re.is_match(email) {
                return Err(ReconcileError::InvalidInput(format!(
                    "participant {:?} has an invalid email {email:?}",
                    p.name
                )));
            }
        }
        if let Some(id) = p.id.as_deref().filter(|id| !id.is_empty()) {
            if !participant_ids.insert(id) {
                return Err(ReconcileError::InvalidInput(format!("participant id {id} appears twice")));
            }
        }
    }

    let mut requirement_ids = HashSet::new();
    for (idx, r) in req.requirements.iter().enumerate() {
        if r.title.trim().is_empty() {
            return Err(ReconcileError::InvalidInput(format!("requirement #{} has no title", idx + 1)));
        }
        if let Some(id) = r.id.as_deref().filter(|id| !id.is_empty()) {
            if !requirement_ids.insert(id) {
                return Err(ReconcileError::InvalidInput(format!("requirement id {id} appears twice")));
            }
        }
        if r.templates.iter().any(|t| t.content_id.trim().is_empty()) {
            return Err(ReconcileError::InvalidInput(format!(
                "requirement {:?} has a template without content id",
                r.title
            )));
        }
    }

    if let Some(reminders) = &req.reminder_config {
        if reminders.enabled && reminders.days_before.is_empty() {
            return Err(ReconcileError::InvalidInput(
                "enabled reminders need at least one day before the deadline".to_string(),
            ));
        }
        let mut days = HashSet::new();
        for day in &reminders.days_before {
            if *day == 0 || !days.insert(*day) {
                return Err(ReconcileError::InvalidInput(format!(
                    "reminder day {day} is zero or repeated"
                )));
            }
        }
    }

    Ok(deadline)
}
