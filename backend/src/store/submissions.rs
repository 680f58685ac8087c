//! Submissions are written by the upload path; reconciliation only counts them
//! and removes them as part of an authorized cascade.

use docket_common::model::submission::Submission;
use rusqlite::{params, Connection, Row};

fn from_row(row: &Row) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get(0)?,
        participant_id: row.get(1)?,
        requirement_id: row.get(2)?,
        content_id: row.get(3)?,
        filename: row.get(4)?,
        size: row.get::<_, i64>(5)? as u64,
    })
}

/// Records an uploaded file. Fails if the participant and the requirement belong
/// to different workspaces.
pub fn insert(conn: &Connection, submission: &Submission) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO submissions (id, participant_id, requirement_id, content_id, filename, size)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            submission.id,
            submission.participant_id,
            submission.requirement_id,
            submission.content_id,
            submission.filename,
            submission.size as i64,
        ],
    )?;
    Ok(())
}

pub fn count_for_participant(conn: &Connection, participant_id: &str) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM submissions WHERE participant_id = ?1",
        params![participant_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

pub fn count_for_requirement(conn: &Connection, requirement_id: &str) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM submissions WHERE requirement_id = ?1",
        params![requirement_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

pub fn content_ids_for_participant(conn: &Connection, participant_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT content_id FROM submissions WHERE participant_id = ?1")?;
    let rows = stmt.query_map(params![participant_id], |row| row.get(0))?;
    rows.collect()
}

pub fn content_ids_for_requirement(conn: &Connection, requirement_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT content_id FROM submissions WHERE requirement_id = ?1")?;
    let rows = stmt.query_map(params![requirement_id], |row| row.get(0))?;
    rows.collect()
}

pub fn references_blob(conn: &Connection, content_id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM submissions WHERE content_id = ?1)",
        params![content_id],
        |row| row.get(0),
    )
}

pub fn delete_for_participant(conn: &Connection, participant_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM submissions WHERE participant_id = ?1",
        params![participant_id],
    )
}

pub fn delete_for_requirement(conn: &Connection, requirement_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM submissions WHERE requirement_id = ?1",
        params![requirement_id],
    )
}

/// Every submission of a workspace, reached through its participants.
pub fn list_for_workspace(conn: &Connection, workspace_id: &str) -> rusqlite::Result<Vec<Submission>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.participant_id, s.requirement_id, s.content_id, s.filename, s.size
         FROM submissions s JOIN participants p ON p.id = s.participant_id
         WHERE p.workspace_id = ?1 ORDER BY s.rowid",
    )?;
    let rows = stmt.query_map(params![workspace_id], from_row)?;
    rows.collect()
}
