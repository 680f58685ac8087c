use docket_common::model::participant::Participant;
use rusqlite::{params, Connection, Row};

fn from_row(row: &Row) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        user_id: row.get(5)?,
    })
}

/// Participants of a workspace in the order the organizer last submitted them.
pub fn list_for_workspace(conn: &Connection, workspace_id: &str) -> rusqlite::Result<Vec<Participant>> {
    let mut stmt = conn.prepare(
        "SELECT id, workspace_id, name, email, phone, user_id
         FROM participants WHERE workspace_id = ?1 ORDER BY position, rowid",
    )?;
    let rows = stmt.query_map(params![workspace_id], from_row)?;
    rows.collect()
}

pub fn insert(conn: &Connection, participant: &Participant, position: usize) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO participants (id, workspace_id, name, email, phone, user_id, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            participant.id,
            participant.workspace_id,
            participant.name,
            participant.email,
            participant.phone,
            participant.user_id,
            position as i64,
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, participant: &Participant, position: usize) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE participants SET name = ?1, email = ?2, phone = ?3, user_id = ?4, position = ?5
         WHERE id = ?6",
        params![
            participant.name,
            participant.email,
            participant.phone,
            participant.user_id,
            position as i64,
            participant.id,
        ],
    )?;
    Ok(())
}

/// Deletes the participant row only; dependents must already be gone.
pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM participants WHERE id = ?1", params![id])?;
    Ok(())
}
