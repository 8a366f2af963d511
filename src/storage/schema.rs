//! Database schema definitions.
//!
//! All statements use `IF NOT EXISTS`, so applying the schema to an existing
//! database is a no-op apart from pending column migrations.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the toolz database.
///
/// Timestamps are stored as RFC 3339 text with nanosecond precision and a
/// `Z` suffix, so lexical order is chronological order.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Context Entries
-- ====================

CREATE TABLE IF NOT EXISTS contexts (
    id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    type TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    tags TEXT,
    project_path TEXT NOT NULL,
    session_id TEXT,
    session_timestamp TEXT,
    metadata TEXT,
    chatgpt_response TEXT,
    claude_response TEXT,
    gemini_response TEXT,
    deepseek_response TEXT
);

CREATE INDEX IF NOT EXISTS idx_type ON contexts(type);
CREATE INDEX IF NOT EXISTS idx_timestamp ON contexts(timestamp);
CREATE INDEX IF NOT EXISTS idx_title ON contexts(title COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_project_path ON contexts(project_path);
CREATE INDEX IF NOT EXISTS idx_session_id ON contexts(session_id);
CREATE INDEX IF NOT EXISTS idx_session_timestamp ON contexts(session_timestamp);

-- ====================
-- Todo Snapshots
-- ====================

-- session_context_id is advisory: foreign key enforcement stays off
CREATE TABLE IF NOT EXISTS todo_snapshots (
    id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    project_path TEXT NOT NULL,
    git_branch TEXT,
    context TEXT,
    session_context_id TEXT,
    is_active INTEGER DEFAULT 0,
    todos TEXT NOT NULL,
    metadata TEXT,
    FOREIGN KEY (session_context_id) REFERENCES contexts(id)
);

CREATE INDEX IF NOT EXISTS idx_todo_project ON todo_snapshots(project_path);
CREATE INDEX IF NOT EXISTS idx_todo_timestamp ON todo_snapshots(timestamp);
CREATE INDEX IF NOT EXISTS idx_todo_active ON todo_snapshots(is_active);
CREATE INDEX IF NOT EXISTS idx_todo_branch ON todo_snapshots(git_branch);
";

/// Apply the schema to the database.
///
/// This uses `execute_batch` to run the entire DDL script, then brings
/// tables created by older versions up to date.
///
/// # Errors
///
/// Returns an error if the SQL execution fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Run migrations for existing databases
    super::migrations::run_migrations(conn)?;

    // Record schema version
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables = names(&conn, "table");
        assert!(tables.contains(&"contexts".to_string()));
        assert!(tables.contains(&"todo_snapshots".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));

        let indexes = names(&conn, "index");
        for idx in [
            "idx_type",
            "idx_timestamp",
            "idx_title",
            "idx_project_path",
            "idx_session_id",
            "idx_session_timestamp",
            "idx_todo_project",
            "idx_todo_timestamp",
            "idx_todo_active",
            "idx_todo_branch",
        ] {
            assert!(indexes.contains(&idx.to_string()), "missing {idx}");
        }
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Apply twice - should not fail
        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations WHERE version = 'v1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_foreign_keys_not_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO todo_snapshots (id, timestamp, project_path, session_context_id, todos)
             VALUES ('t1', '2025-01-01T00:00:00Z', '/proj', 'missing-context', '[]')",
            [],
        )
        .expect("dangling session_context_id should be accepted");
    }
}
