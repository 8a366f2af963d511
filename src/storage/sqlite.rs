//! SQLite storage implementation.
//!
//! [`SqliteStorage`] holds only the database path. Each operation opens its
//! own connection through [`open_connection`], uses it, and drops it, so any
//! number of processes can share the file. Context and todo snapshot
//! operations live in the `contexts` and `todos` submodules.

use crate::error::{Error, Result};
use crate::storage::connection::open_connection;
use crate::storage::schema::apply_schema;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default page size for list operations.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Default result cap for search operations.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// SQLite-based storage backend.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    path: PathBuf,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the parent directory and the database if they don't exist,
    /// applies the schema, and runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path)?;
        apply_schema(&conn)?;
        debug!(path = %path.display(), "Database ready");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh, configured connection for one operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn connect(&self) -> Result<Connection> {
        open_connection(&self.path)
    }

    /// Execute a mutation inside an IMMEDIATE transaction.
    ///
    /// The write lock is taken before the closure runs, so read-then-write
    /// sequences cannot interleave with another writer. The transaction
    /// commits when the closure succeeds and rolls back otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        debug!(op, "Write lock acquired");
        let result = f(&tx)?;

        tx.commit()?;
        Ok(result)
    }
}

// ==================
// Row encoding helpers
// ==================

/// Encode a timestamp as RFC 3339 with nanoseconds and a `Z` suffix.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decode a stored timestamp.
///
/// Accepts RFC 3339 with any offset, and naive ISO-8601 text (read as UTC)
/// written by older tools.
pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::Other(format!("Invalid stored timestamp: {raw}")))
}

pub(crate) fn decode_optional_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.filter(|s| !s.is_empty()).map(decode_timestamp).transpose()
}

/// Substring `LIKE` pattern for `query`, for clauses written with `ESCAPE '\'`.
///
/// `\`, `%` and `_` in the query match literally.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Read an optional column that older databases may not have.
pub(crate) fn get_optional_column(
    row: &rusqlite::Row,
    name: &str,
) -> rusqlite::Result<Option<String>> {
    match row.get(name) {
        Ok(value) => Ok(value),
        Err(rusqlite::Error::InvalidColumnName(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Decode a JSON object column, treating NULL or blank text as empty.
pub(crate) fn decode_metadata(raw: Option<&str>) -> Result<crate::model::Metadata> {
    match raw.map(str::trim) {
        None | Some("" | "null") => Ok(crate::model::Metadata::new()),
        Some(text) => Ok(serde_json::from_str(text)?),
    }
}
