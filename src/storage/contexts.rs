//! Context entry operations.

use super::sqlite::{
    decode_metadata, decode_optional_timestamp, decode_timestamp, encode_timestamp,
    get_optional_column, like_pattern, SqliteStorage, DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT,
};
use crate::error::{Error, Result};
use crate::model::{Backend, ContextContent, ContextEntry, SessionSummary};
use crate::validate::{validate_tags, TAG_DELIMITER};
use rusqlite::{Connection, OptionalExtension, ToSql};
use tracing::debug;

/// A `contexts` row before JSON and timestamp decoding.
struct ContextRow {
    id: String,
    timestamp: String,
    context_type: String,
    title: String,
    content: String,
    tags: Option<String>,
    project_path: String,
    session_id: Option<String>,
    session_timestamp: Option<String>,
    metadata: Option<String>,
    chatgpt_response: Option<String>,
    claude_response: Option<String>,
    gemini_response: Option<String>,
    deepseek_response: Option<String>,
}

/// Map a `SELECT *` row. Response columns added by migrations may be absent.
fn map_context_row(row: &rusqlite::Row) -> rusqlite::Result<ContextRow> {
    Ok(ContextRow {
        id: row.get("id")?,
        timestamp: row.get("timestamp")?,
        context_type: row.get("type")?,
        title: row.get("title")?,
        content: row.get("content")?,
        tags: row.get("tags")?,
        project_path: row.get("project_path")?,
        session_id: row.get("session_id")?,
        session_timestamp: row.get("session_timestamp")?,
        metadata: row.get("metadata")?,
        chatgpt_response: get_optional_column(row, "chatgpt_response")?,
        claude_response: get_optional_column(row, "claude_response")?,
        gemini_response: get_optional_column(row, "gemini_response")?,
        deepseek_response: get_optional_column(row, "deepseek_response")?,
    })
}

impl ContextRow {
    fn into_entry(self) -> Result<ContextEntry> {
        let content: ContextContent = serde_json::from_str(&self.content)?;
        let tags = self
            .tags
            .filter(|t| !t.is_empty())
            .map(|t| t.split(TAG_DELIMITER).map(ToString::to_string).collect())
            .unwrap_or_default();

        Ok(ContextEntry {
            timestamp: decode_timestamp(&self.timestamp)?,
            session_timestamp: decode_optional_timestamp(self.session_timestamp.as_deref())?,
            metadata: decode_metadata(self.metadata.as_deref())?,
            id: self.id,
            context_type: self.context_type,
            title: self.title,
            content,
            tags,
            project_path: self.project_path,
            session_id: self.session_id,
            chatgpt_response: self.chatgpt_response,
            claude_response: self.claude_response,
            gemini_response: self.gemini_response,
            deepseek_response: self.deepseek_response,
        })
    }
}

/// Run a `SELECT * FROM contexts ...` query and decode every row.
fn query_contexts(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<ContextEntry>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_context_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(ContextRow::into_entry).collect()
}

impl SqliteStorage {
    // ==================
    // Context Operations
    // ==================

    /// Save a context entry, replacing every column of an existing row with
    /// the same id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a tag contains the tag delimiter, or an
    /// error if serialization or the write fails.
    pub fn save_context(&self, entry: &ContextEntry) -> Result<()> {
        validate_tags(&entry.tags)?;

        let content = serde_json::to_string(&entry.content)?;
        let metadata = serde_json::to_string(&entry.metadata)?;
        let tags = entry.tags.join(&TAG_DELIMITER.to_string());

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO contexts
             (id, timestamp, type, title, content, tags, project_path, session_id,
              session_timestamp, metadata, chatgpt_response, claude_response,
              gemini_response, deepseek_response)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(id) DO UPDATE SET
                timestamp = excluded.timestamp,
                type = excluded.type,
                title = excluded.title,
                content = excluded.content,
                tags = excluded.tags,
                project_path = excluded.project_path,
                session_id = excluded.session_id,
                session_timestamp = excluded.session_timestamp,
                metadata = excluded.metadata,
                chatgpt_response = excluded.chatgpt_response,
                claude_response = excluded.claude_response,
                gemini_response = excluded.gemini_response,
                deepseek_response = excluded.deepseek_response",
            rusqlite::params![
                entry.id,
                encode_timestamp(&entry.timestamp),
                entry.context_type,
                entry.title,
                content,
                tags,
                entry.project_path,
                entry.session_id,
                entry.session_timestamp.as_ref().map(encode_timestamp),
                metadata,
                entry.chatgpt_response,
                entry.claude_response,
                entry.gemini_response,
                entry.deepseek_response,
            ],
        )?;

        debug!(id = %entry.id, "Saved context");
        Ok(())
    }

    /// Get a context entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row cannot be decoded.
    pub fn get_context(&self, id: &str) -> Result<Option<ContextEntry>> {
        let conn = self.connect()?;
        conn.query_row("SELECT * FROM contexts WHERE id = ?1", [id], map_context_row)
            .optional()?
            .map(ContextRow::into_entry)
            .transpose()
    }

    /// List context entries, newest first.
    ///
    /// Filters are ANDed; `None` means no filter on that column.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_contexts(
        &self,
        type_filter: Option<&str>,
        project_path: Option<&str>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<ContextEntry>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let offset = offset.unwrap_or(0);

        let mut sql = String::from("SELECT * FROM contexts");
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(t) = type_filter {
            conditions.push("type = ?");
            params.push(Box::new(t.to_string()));
        }
        if let Some(p) = project_path {
            conditions.push("project_path = ?");
            params.push(Box::new(p.to_string()));
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(" ORDER BY timestamp DESC LIMIT ? OFFSET ?");
        params.push(Box::new(limit));
        params.push(Box::new(offset));

        let params_refs: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
        query_contexts(&self.connect()?, &sql, &params_refs)
    }

    /// Search context entries whose title, content, or tags contain `query`.
    ///
    /// Matching uses SQLite `LIKE`, which ignores ASCII case. `%` and `_` in
    /// `query` match literally.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn search_contexts(
        &self,
        query: &str,
        type_filter: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<ContextEntry>> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let pattern = like_pattern(query);

        let mut sql = String::from(
            "SELECT * FROM contexts
             WHERE (title LIKE ?1 ESCAPE '\\' OR content LIKE ?1 ESCAPE '\\'
                    OR tags LIKE ?1 ESCAPE '\\')",
        );
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(pattern)];

        if let Some(t) = type_filter {
            sql.push_str(" AND type = ?2");
            params.push(Box::new(t.to_string()));
        }

        sql.push_str(&format!(" ORDER BY timestamp DESC LIMIT ?{}", params.len() + 1));
        params.push(Box::new(limit));

        let params_refs: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
        query_contexts(&self.connect()?, &sql, &params_refs)
    }

    /// Store `response` in the column owned by `backend`.
    ///
    /// Touches no other column. A missing id is a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_response(&self, id: &str, backend: Backend, response: &str) -> Result<()> {
        let sql = format!(
            "UPDATE contexts SET {} = ?1 WHERE id = ?2",
            backend.response_column()
        );
        let rows = self.connect()?.execute(&sql, rusqlite::params![response, id])?;
        debug!(id, backend = backend.as_str(), rows, "Updated response");
        Ok(())
    }

    /// Store a ChatGPT response. See [`Self::update_response`].
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_chatgpt_response(&self, id: &str, response: &str) -> Result<()> {
        self.update_response(id, Backend::ChatGpt, response)
    }

    /// Store a Claude response. See [`Self::update_response`].
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_claude_response(&self, id: &str, response: &str) -> Result<()> {
        self.update_response(id, Backend::Claude, response)
    }

    /// Store a Gemini response. See [`Self::update_response`].
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_gemini_response(&self, id: &str, response: &str) -> Result<()> {
        self.update_response(id, Backend::Gemini, response)
    }

    /// Store a DeepSeek response. See [`Self::update_response`].
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_deepseek_response(&self, id: &str, response: &str) -> Result<()> {
        self.update_response(id, Backend::DeepSeek, response)
    }

    /// Delete a context entry. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_context(&self, id: &str) -> Result<bool> {
        let rows = self
            .connect()?
            .execute("DELETE FROM contexts WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Context entries whose tags contain any of `tags`, newest first.
    ///
    /// Matching is substring containment on the joined tag column, so `py`
    /// also matches an entry tagged `python`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `tags` is empty, or an error if the
    /// query fails.
    pub fn get_contexts_by_tags(
        &self,
        tags: &[String],
        limit: Option<u32>,
    ) -> Result<Vec<ContextEntry>> {
        if tags.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one tag is required".to_string(),
            ));
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

        let conditions = vec!["tags LIKE ? ESCAPE '\\'"; tags.len()].join(" OR ");
        let sql = format!(
            "SELECT * FROM contexts WHERE {conditions} ORDER BY timestamp DESC LIMIT ?"
        );

        let mut params: Vec<Box<dyn ToSql>> = tags
            .iter()
            .map(|tag| Box::new(like_pattern(tag)) as Box<dyn ToSql>)
            .collect();
        params.push(Box::new(limit));

        let params_refs: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
        query_contexts(&self.connect()?, &sql, &params_refs)
    }

    /// Sessions recorded for a project, most recent session first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_sessions(
        &self,
        project_path: &str,
        limit: Option<u32>,
    ) -> Result<Vec<SessionSummary>> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT session_id,
                    MAX(session_timestamp) AS session_timestamp,
                    COUNT(*) AS context_count,
                    MIN(timestamp) AS first_context,
                    MAX(timestamp) AS last_context
             FROM contexts
             WHERE project_path = ?1 AND session_id IS NOT NULL
             GROUP BY session_id
             ORDER BY MAX(session_timestamp) DESC
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![project_path, limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(session_id, session_ts, count, first, last)| {
                Ok(SessionSummary {
                    session_id,
                    session_timestamp: decode_optional_timestamp(session_ts.as_deref())?,
                    context_count: count,
                    first_context: decode_timestamp(&first)?,
                    last_context: decode_timestamp(&last)?,
                })
            })
            .collect()
    }

    /// All context entries of a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_session_contexts(&self, session_id: &str) -> Result<Vec<ContextEntry>> {
        query_contexts(
            &self.connect()?,
            "SELECT * FROM contexts WHERE session_id = ?1 ORDER BY timestamp ASC",
            &[&session_id],
        )
    }
}
