use super::{conversion_error, UnknownValue};
use chrono::{DateTime, Utc};
use docket_common::model::workspace::{ReminderConfig, Workspace, WorkspaceStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, owner_id, title, description, deadline, status, reminder_config";

fn from_row(row: &Row) -> rusqlite::Result<Workspace> {
    let deadline: String = row.get(4)?;
    let deadline = DateTime::parse_from_rfc3339(&deadline)
        .map_err(|e| conversion_error(4, e))?
        .with_timezone(&Utc);
    let status: String = row.get(5)?;
    let status = status
        .parse::<WorkspaceStatus>()
        .map_err(|_| conversion_error(5, UnknownValue(status.clone())))?;
    let reminder_config: String = row.get(6)?;
    let reminder_config: ReminderConfig =
        serde_json::from_str(&reminder_config).map_err(|e| conversion_error(6, e))?;

    Ok(Workspace {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        deadline,
        status,
        reminder_config,
    })
}

fn reminder_json(config: &ReminderConfig) -> rusqlite::Result<String> {
    serde_json::to_string(config).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub fn insert(conn: &Connection, workspace: &Workspace) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO workspaces (id, owner_id, title, description, deadline, status, reminder_config)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            workspace.id,
            workspace.owner_id,
            workspace.title,
            workspace.description,
            workspace.deadline.to_rfc3339(),
            workspace.status.as_str(),
            reminder_json(&workspace.reminder_config)?,
        ],
    )?;
    Ok(())
}

pub fn find(conn: &Connection, id: &str) -> rusqlite::Result<Option<Workspace>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM workspaces WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

/// Writes the mutable fields of `workspace`. The owner never changes.
pub fn update(conn: &Connection, workspace: &Workspace) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE workspaces
         SET title = ?1, description = ?2, deadline = ?3, status = ?4, reminder_config = ?5,
             updated_at = CURRENT_TIMESTAMP
         WHERE id = ?6",
        params![
            workspace.title,
            workspace.description,
            workspace.deadline.to_rfc3339(),
            workspace.status.as_str(),
            reminder_json(&workspace.reminder_config)?,
            workspace.id,
        ],
    )?;
    Ok(())
}
