//! Notification-recipient records: one row per reminder delivered to a participant.
//! They never block a removal but must be deleted before their participant.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

pub fn record(conn: &Connection, participant_id: &str, sent_at: DateTime<Utc>) -> rusqlite::Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO reminder_recipients (id, participant_id, sent_at) VALUES (?1, ?2, ?3)",
        params![id, participant_id, sent_at.to_rfc3339()],
    )?;
    Ok(id)
}

pub fn count_for_participant(conn: &Connection, participant_id: &str) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reminder_recipients WHERE participant_id = ?1",
        params![participant_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

pub fn delete_for_participant(conn: &Connection, participant_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM reminder_recipients WHERE participant_id = ?1",
        params![participant_id],
    )
}
