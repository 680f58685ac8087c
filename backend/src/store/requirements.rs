use super::conversion_error;
use docket_common::model::requirement::{RequirementSpec, TemplateFile};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str =
    "id, workspace_id, title, description, required, allow_multiple_files, templates, archive_content_id";

fn from_row(row: &Row) -> rusqlite::Result<RequirementSpec> {
    let templates: String = row.get(6)?;
    let templates: Vec<TemplateFile> =
        serde_json::from_str(&templates).map_err(|e| conversion_error(6, e))?;
    Ok(RequirementSpec {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        required: row.get(4)?,
        allow_multiple_files: row.get(5)?,
        templates,
        archive_content_id: row.get(7)?,
    })
}

/// The structured-column form of a template list. Also the value archive writes
/// compare against, so it must stay deterministic for equal lists.
pub fn templates_json(templates: &[TemplateFile]) -> rusqlite::Result<String> {
    serde_json::to_string(templates).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub fn list_for_workspace(
    conn: &Connection,
    workspace_id: &str,
) -> rusqlite::Result<Vec<RequirementSpec>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM requirements WHERE workspace_id = ?1 ORDER BY position, rowid"
    ))?;
    let rows = stmt.query_map(params![workspace_id], from_row)?;
    rows.collect()
}

pub fn find(conn: &Connection, id: &str) -> rusqlite::Result<Option<RequirementSpec>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM requirements WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

pub fn insert(conn: &Connection, requirement: &RequirementSpec, position: usize) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO requirements
            (id, workspace_id, title, description, required, allow_multiple_files, templates,
             archive_content_id, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            requirement.id,
            requirement.workspace_id,
            requirement.title,
            requirement.description,
            requirement.required,
            requirement.allow_multiple_files,
            templates_json(&requirement.templates)?,
            requirement.archive_content_id,
            position as i64,
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, requirement: &RequirementSpec, position: usize) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE requirements
         SET title = ?1, description = ?2, required = ?3, allow_multiple_files = ?4,
             templates = ?5, archive_content_id = ?6, position = ?7
         WHERE id = ?8",
        params![
            requirement.title,
            requirement.description,
            requirement.required,
            requirement.allow_multiple_files,
            templates_json(&requirement.templates)?,
            requirement.archive_content_id,
            position as i64,
            requirement.id,
        ],
    )?;
    Ok(())
}

/// Sets the archive pointer only if the stored template list still equals
/// `templates`. A new archive is only accepted while the pointer is empty, so two
/// builds of the same list cannot replace each other. Returns whether the row was
/// written.
pub fn set_archive_if_templates_match(
    conn: &Connection,
    id: &str,
    templates: &[TemplateFile],
    archive_content_id: Option<&str>,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE requirements SET archive_content_id = ?1
         WHERE id = ?2 AND templates = ?3 AND (?1 IS NULL OR archive_content_id IS NULL)",
        params![archive_content_id, id, templates_json(templates)?],
    )?;
    Ok(changed > 0)
}

/// Whether any requirement, in any workspace, lists `content_id` as a template or
/// points at it as its archive.
pub fn references_blob(conn: &Connection, content_id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM requirements r
            WHERE r.archive_content_id = ?1
               OR EXISTS (
                   SELECT 1 FROM json_each(r.templates) t
                   WHERE json_extract(t.value, '$.contentId') = ?1
               )
         )",
        params![content_id],
        |row| row.get(0),
    )
}

/// Deletes the requirement row only; submissions must already be gone.
pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM requirements WHERE id = ?1", params![id])?;
    Ok(())
}
