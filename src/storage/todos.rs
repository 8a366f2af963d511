//! Todo snapshot operations.
//!
//! At most one snapshot per project is active. Saving an active snapshot
//! clears the flag on the project's other snapshots and upserts the new one
//! in a single IMMEDIATE transaction, so concurrent savers serialize on the
//! write lock instead of both winning.

use super::sqlite::{
    decode_metadata, decode_timestamp, encode_timestamp, like_pattern, SqliteStorage,
    DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT,
};
use crate::error::{Error, Result};
use crate::model::{Todo, TodoListSnapshot};
use rusqlite::{Connection, OptionalExtension, ToSql};
use tracing::{debug, error};

/// A `todo_snapshots` row before JSON and timestamp decoding.
struct SnapshotRow {
    id: String,
    timestamp: String,
    project_path: String,
    git_branch: Option<String>,
    context: Option<String>,
    session_context_id: Option<String>,
    is_active: Option<i64>,
    todos: String,
    metadata: Option<String>,
}

fn map_snapshot_row(row: &rusqlite::Row) -> rusqlite::Result<SnapshotRow> {
    Ok(SnapshotRow {
        id: row.get("id")?,
        timestamp: row.get("timestamp")?,
        project_path: row.get("project_path")?,
        git_branch: row.get("git_branch")?,
        context: row.get("context")?,
        session_context_id: row.get("session_context_id")?,
        is_active: row.get("is_active")?,
        todos: row.get("todos")?,
        metadata: row.get("metadata")?,
    })
}

impl SnapshotRow {
    fn into_snapshot(self) -> Result<TodoListSnapshot> {
        let todos: Vec<Todo> = serde_json::from_str(&self.todos)?;
        Ok(TodoListSnapshot {
            timestamp: decode_timestamp(&self.timestamp)?,
            metadata: decode_metadata(self.metadata.as_deref())?,
            id: self.id,
            project_path: self.project_path,
            git_branch: self.git_branch,
            context: self.context,
            session_context_id: self.session_context_id,
            is_active: self.is_active.unwrap_or(0) != 0,
            todos,
        })
    }
}

fn query_snapshots(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<TodoListSnapshot>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_snapshot_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(SnapshotRow::into_snapshot).collect()
}

impl SqliteStorage {
    // ==================
    // Todo Snapshot Operations
    // ==================

    /// Save a todo snapshot, replacing any existing snapshot with the same id.
    ///
    /// When the snapshot is active, every other snapshot of its project is
    /// deactivated in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any write fails; nothing is
    /// changed in that case.
    pub fn save_todo_snapshot(&self, snapshot: &TodoListSnapshot) -> Result<()> {
        let todos = serde_json::to_string(&snapshot.todos)?;
        let metadata = serde_json::to_string(&snapshot.metadata)?;

        self.mutate("save_todo_snapshot", |tx| {
            if snapshot.is_active {
                let cleared = tx.execute(
                    "UPDATE todo_snapshots SET is_active = 0
                     WHERE project_path = ?1 AND is_active = 1",
                    [&snapshot.project_path],
                )?;
                debug!(project = %snapshot.project_path, cleared, "Cleared active snapshots");
            }

            tx.execute(
                "INSERT INTO todo_snapshots
                 (id, timestamp, project_path, git_branch, context, session_context_id,
                  is_active, todos, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    timestamp = excluded.timestamp,
                    project_path = excluded.project_path,
                    git_branch = excluded.git_branch,
                    context = excluded.context,
                    session_context_id = excluded.session_context_id,
                    is_active = excluded.is_active,
                    todos = excluded.todos,
                    metadata = excluded.metadata",
                rusqlite::params![
                    snapshot.id,
                    encode_timestamp(&snapshot.timestamp),
                    snapshot.project_path,
                    snapshot.git_branch,
                    snapshot.context,
                    snapshot.session_context_id,
                    i64::from(snapshot.is_active),
                    todos,
                    metadata,
                ],
            )?;
            Ok(())
        })?;

        debug!(id = %snapshot.id, active = snapshot.is_active, "Saved todo snapshot");
        Ok(())
    }

    /// Get a todo snapshot by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row cannot be decoded.
    pub fn get_todo_snapshot(&self, id: &str) -> Result<Option<TodoListSnapshot>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT * FROM todo_snapshots WHERE id = ?1",
            [id],
            map_snapshot_row,
        )
        .optional()?
        .map(SnapshotRow::into_snapshot)
        .transpose()
    }

    /// The active snapshot of a project, if any.
    ///
    /// # Errors
    ///
    /// Returns `MultipleActiveSnapshots` if the database holds more than one
    /// active snapshot for the project, or an error if the query fails.
    pub fn get_active_todo_snapshot(&self, project_path: &str) -> Result<Option<TodoListSnapshot>> {
        let mut active = query_snapshots(
            &self.connect()?,
            "SELECT * FROM todo_snapshots
             WHERE project_path = ?1 AND is_active = 1
             ORDER BY timestamp DESC",
            &[&project_path],
        )?;

        if active.len() > 1 {
            let ids: Vec<&str> = active.iter().map(|s| s.id.as_str()).collect();
            error!(
                project = project_path,
                count = active.len(),
                ids = ?ids,
                "Multiple active todo snapshots"
            );
            return Err(Error::MultipleActiveSnapshots {
                project_path: project_path.to_string(),
                count: active.len(),
            });
        }

        Ok(active.pop())
    }

    /// List todo snapshots, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_todo_snapshots(
        &self,
        project_path: Option<&str>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<TodoListSnapshot>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let offset = offset.unwrap_or(0);
        let conn = self.connect()?;

        match project_path {
            Some(path) => query_snapshots(
                &conn,
                "SELECT * FROM todo_snapshots WHERE project_path = ?1
                 ORDER BY timestamp DESC LIMIT ?2 OFFSET ?3",
                &[&path, &limit, &offset],
            ),
            None => query_snapshots(
                &conn,
                "SELECT * FROM todo_snapshots ORDER BY timestamp DESC LIMIT ?1 OFFSET ?2",
                &[&limit, &offset],
            ),
        }
    }

    /// Search todo snapshots whose todos or context description contain `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn search_todo_snapshots(
        &self,
        query: &str,
        project_path: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<TodoListSnapshot>> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let pattern = like_pattern(query);
        let conn = self.connect()?;

        match project_path {
            Some(path) => query_snapshots(
                &conn,
                "SELECT * FROM todo_snapshots
                 WHERE (todos LIKE ?1 ESCAPE '\\' OR context LIKE ?1 ESCAPE '\\')
                   AND project_path = ?2
                 ORDER BY timestamp DESC LIMIT ?3",
                &[&pattern, &path, &limit],
            ),
            None => query_snapshots(
                &conn,
                "SELECT * FROM todo_snapshots
                 WHERE (todos LIKE ?1 ESCAPE '\\' OR context LIKE ?1 ESCAPE '\\')
                 ORDER BY timestamp DESC LIMIT ?2",
                &[&pattern, &limit],
            ),
        }
    }

    /// Delete a todo snapshot. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_todo_snapshot(&self, id: &str) -> Result<bool> {
        let rows = self
            .connect()?
            .execute("DELETE FROM todo_snapshots WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
