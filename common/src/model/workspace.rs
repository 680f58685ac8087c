use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle of a collection campaign.
///
/// Stored in the `workspaces.status` column using the kebab-case names
/// (`open`, `limited-open`, `closed`, `closed-expired`, `reopened`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceStatus {
    Open,
    LimitedOpen,
    Closed,
    ClosedExpired,
    Reopened,
}

impl WorkspaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::LimitedOpen => "limited-open",
            Self::Closed => "closed",
            Self::ClosedExpired => "closed-expired",
            Self::Reopened => "reopened",
        }
    }

    /// Whether a reopen confirmation can move this workspace to `Reopened`.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed | Self::ClosedExpired)
    }
}

impl FromStr for WorkspaceStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Self::Open),
            "limited-open" => Ok(Self::LimitedOpen),
            "closed" => Ok(Self::Closed),
            "closed-expired" => Ok(Self::ClosedExpired),
            "reopened" => Ok(Self::Reopened),
            _ => Err(()),
        }
    }
}

/// Reminder schedule for a workspace. Persisted as JSON; delivery happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Days before the deadline on which a reminder goes out.
    #[serde(default)]
    pub days_before: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub status: WorkspaceStatus,
    pub reminder_config: ReminderConfig,
}
