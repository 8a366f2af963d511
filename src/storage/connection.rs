//! Connection setup for the shared database file.
//!
//! Every storage operation opens its own short-lived connection through
//! [`open_connection`]. The file may be shared by several processes and may
//! sit on a network or cloud-synced filesystem, so each open:
//!
//! 1. Creates the parent directory if needed
//! 2. Sets the busy timeout (before any pragma that could hit a lock)
//! 3. Picks a journal mode: DELETE for cloud-synced paths, otherwise WAL
//!    with a DELETE fallback when the filesystem refuses WAL

use crate::error::{Error, Result};
use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Path fragments that mark a directory managed by a file-sync client.
///
/// Sync clients upload the `-wal` file separately from the main database,
/// which corrupts WAL databases.
pub const CLOUD_SYNC_INDICATORS: [&str; 10] = [
    "/Dropbox/",
    "\\Dropbox\\",
    "/Google Drive/",
    "\\Google Drive\\",
    "/OneDrive/",
    "\\OneDrive\\",
    "/iCloud Drive/",
    "Library/Mobile Documents/",
    "/Box/",
    "\\Box\\",
];

/// Journal mode in effect for a connection, as reported by SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    Wal,
    Delete,
    Truncate,
    Persist,
    /// In-memory databases keep their journal in memory whatever is asked.
    Memory,
    Off,
}

impl JournalMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
            Self::Truncate => "truncate",
            Self::Persist => "persist",
            Self::Memory => "memory",
            Self::Off => "off",
        }
    }

    /// Parse the value returned by `PRAGMA journal_mode`.
    #[must_use]
    pub fn from_pragma(value: &str) -> Option<Self> {
        [
            Self::Wal,
            Self::Delete,
            Self::Truncate,
            Self::Persist,
            Self::Memory,
            Self::Off,
        ]
        .into_iter()
        .find(|mode| value.eq_ignore_ascii_case(mode.as_str()))
    }
}

impl fmt::Display for JournalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `path` lives inside a cloud-synced directory.
///
/// Matching is a case-sensitive substring test on the absolute path.
#[must_use]
pub fn is_cloud_synced_path(path: &Path) -> bool {
    let resolved = absolute_path(path);
    let path_str = resolved.to_string_lossy();
    CLOUD_SYNC_INDICATORS
        .iter()
        .any(|indicator| path_str.contains(indicator))
}

fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    // The file may not exist yet; resolve the parent instead.
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        if let Ok(parent) = parent.canonicalize() {
            return parent.join(name);
        }
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Open a configured connection to the database at `path`.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the file
/// cannot be opened, or the busy timeout cannot be set.
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    configure_connection(&conn, path)?;
    Ok(conn)
}

/// Apply busy timeout and journal mode to an open connection.
///
/// Returns the journal mode SQLite reports as in effect. In-memory
/// databases report [`JournalMode::Memory`] whatever is requested.
///
/// # Errors
///
/// Returns an error if the busy timeout cannot be set, if DELETE mode
/// cannot be requested, or if SQLite reports an unknown journal mode.
pub fn configure_connection(conn: &Connection, path: &Path) -> Result<JournalMode> {
    conn.busy_timeout(BUSY_TIMEOUT)?;

    if is_cloud_synced_path(path) {
        let mode = set_journal_mode(conn, "DELETE")?;
        let dir = path.parent().unwrap_or(path);
        warn!(
            directory = %dir.display(),
            "Database is in a cloud-synced directory; using DELETE journal mode instead of WAL. \
             Consider a local directory for better concurrent access."
        );
        return Ok(mode);
    }

    match set_journal_mode(conn, "WAL") {
        Ok(JournalMode::Wal) => Ok(JournalMode::Wal),
        Ok(granted) => {
            debug!(granted = %granted, "WAL mode not available, using DELETE journal mode");
            set_journal_mode(conn, "DELETE")
        }
        Err(e) => {
            debug!(error = %e, "WAL mode failed, using DELETE journal mode");
            set_journal_mode(conn, "DELETE")
        }
    }
}

/// Request a journal mode and return the one the engine reports back.
fn set_journal_mode(conn: &Connection, requested: &str) -> Result<JournalMode> {
    let reported: String =
        conn.pragma_update_and_check(None, "journal_mode", requested, |row| row.get(0))?;
    JournalMode::from_pragma(&reported)
        .ok_or_else(|| Error::Other(format!("Unexpected journal mode reported: {reported}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn journal_mode(conn: &Connection) -> String {
        conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_cloud_indicators() {
        assert!(is_cloud_synced_path(Path::new(
            "/Users/me/Dropbox/work/contexts.db"
        )));
        assert!(is_cloud_synced_path(Path::new(
            "/Users/me/Library/Mobile Documents/com~apple~CloudDocs/c.db"
        )));
        assert!(is_cloud_synced_path(Path::new("/home/me/Google Drive/c.db")));
        assert!(!is_cloud_synced_path(Path::new("/home/me/dropbox/c.db")));
        assert!(!is_cloud_synced_path(Path::new("/home/me/.mcp-toolz/c.db")));
    }

    #[test]
    fn test_local_path_uses_wal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("local.db");

        let conn = open_connection(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(journal_mode(&conn), "wal");
        assert_eq!(configure_connection(&conn, &path).unwrap(), JournalMode::Wal);
    }

    #[test]
    fn test_cloud_path_uses_delete() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Dropbox").join("contexts.db");

        let conn = open_connection(&path).unwrap();
        assert_eq!(journal_mode(&conn), "delete");
        assert_eq!(
            configure_connection(&conn, &path).unwrap(),
            JournalMode::Delete
        );
    }

    #[test]
    fn test_busy_timeout_is_set() {
        let temp = TempDir::new().unwrap();
        let conn = open_connection(&temp.path().join("t.db")).unwrap();
        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);
    }

    #[test]
    fn test_memory_database_reports_memory_journal() {
        let conn = Connection::open_in_memory().unwrap();
        let mode = configure_connection(&conn, Path::new("/tmp/mem.db")).unwrap();
        assert_eq!(mode, JournalMode::Memory);
        assert_eq!(journal_mode(&conn), mode.as_str());
    }

    #[test]
    fn test_parse_reported_modes() {
        assert_eq!(JournalMode::from_pragma("WAL"), Some(JournalMode::Wal));
        assert_eq!(JournalMode::from_pragma("delete"), Some(JournalMode::Delete));
        assert_eq!(JournalMode::from_pragma("memory"), Some(JournalMode::Memory));
        assert_eq!(JournalMode::from_pragma("bogus"), None);
    }
}
