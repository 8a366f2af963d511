//! Command implementations.

pub mod ask;
pub mod completions;
pub mod context;
pub mod todo;
pub mod version;

use crate::config::{current_project_path, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use std::path::PathBuf;

/// Resolve the database path and open the store.
pub(crate) fn open_storage(db_path: Option<&PathBuf>) -> Result<SqliteStorage> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path())).ok_or_else(|| {
        Error::Config("Could not determine home directory; pass --db".to_string())
    })?;
    SqliteStorage::open(&db_path)
}

/// Explicit project path, else the current directory.
pub(crate) fn resolve_project(explicit: Option<&str>) -> Result<String> {
    if let Some(path) = explicit {
        return Ok(path.to_string());
    }
    current_project_path()
        .map(|p| p.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Config("Could not determine current directory".to_string()))
}

/// Shorten `s` to at most `max` characters, marking the cut with "...".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    if first_line.chars().count() <= max && first_line.len() == s.len() {
        return s.to_string();
    }
    let cut: String = first_line.chars().take(max).collect();
    format!("{cut}...")
}
