use rusqlite::Connection;

/// Creates every table and trigger the service needs. Safe to run on each start.
///
/// Foreign keys carry no `ON DELETE CASCADE`: removal of a participant or a
/// requirement deletes its dependents explicitly inside the reconciliation
/// transaction, after the conflict check allowed it.
pub(super) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS workspaces (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            deadline TEXT NOT NULL,
            status TEXT NOT NULL,
            reminder_config TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS participants (
            id TEXT PRIMARY KEY,
            workspace_id TEXT NOT NULL REFERENCES workspaces(id),
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            user_id TEXT,
            position INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS participants_workspace ON participants(workspace_id);

        CREATE TABLE IF NOT EXISTS requirements (
            id TEXT PRIMARY KEY,
            workspace_id TEXT NOT NULL REFERENCES workspaces(id),
            title TEXT NOT NULL,
            description TEXT,
            required INTEGER NOT NULL DEFAULT 1,
            allow_multiple_files INTEGER NOT NULL DEFAULT 0,
            templates TEXT NOT NULL DEFAULT '[]',
            archive_content_id TEXT,
            position INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS requirements_workspace ON requirements(workspace_id);

        CREATE TABLE IF NOT EXISTS submissions (
            id TEXT PRIMARY KEY,
            participant_id TEXT NOT NULL REFERENCES participants(id),
            requirement_id TEXT NOT NULL REFERENCES requirements(id),
            content_id TEXT NOT NULL,
            filename TEXT NOT NULL,
            size INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS submissions_participant ON submissions(participant_id);
        CREATE INDEX IF NOT EXISTS submissions_requirement ON submissions(requirement_id);

        CREATE TRIGGER IF NOT EXISTS submissions_same_workspace
        BEFORE INSERT ON submissions
        WHEN (SELECT workspace_id FROM participants WHERE id = NEW.participant_id)
            IS NOT (SELECT workspace_id FROM requirements WHERE id = NEW.requirement_id)
        BEGIN
            SELECT RAISE(ABORT, 'submission parents belong to different workspaces');
        END;

        CREATE TABLE IF NOT EXISTS reminder_recipients (
            id TEXT PRIMARY KEY,
            participant_id TEXT NOT NULL REFERENCES participants(id),
            sent_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS reminder_recipients_participant
            ON reminder_recipients(participant_id);
        ",
    )
}
