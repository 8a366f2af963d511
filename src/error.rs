//! Error types for toolz.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Retryability flags so callers know when a second attempt can succeed
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use crate::model::Backend;
use thiserror::Error;

/// Result type alias for toolz operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Agents match on the string; shell scripts on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    DatabaseError,
    DatabaseBusy,

    // Not Found (exit 3)
    ContextNotFound,
    SnapshotNotFound,
    NoActiveSnapshot,

    // Validation (exit 4)
    InvalidArgument,

    // Integrity (exit 5)
    MultipleActiveSnapshots,

    // Config (exit 7)
    ConfigError,
    MissingCredential,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Opinion backend (exit 9)
    BackendError,
    BackendTimeout,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::DatabaseError => "DATABASE_ERROR",
            Self::DatabaseBusy => "DATABASE_BUSY",
            Self::ContextNotFound => "CONTEXT_NOT_FOUND",
            Self::SnapshotNotFound => "SNAPSHOT_NOT_FOUND",
            Self::NoActiveSnapshot => "NO_ACTIVE_SNAPSHOT",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::MultipleActiveSnapshots => "MULTIPLE_ACTIVE_SNAPSHOTS",
            Self::ConfigError => "CONFIG_ERROR",
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::BackendError => "BACKEND_ERROR",
            Self::BackendTimeout => "BACKEND_TIMEOUT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::DatabaseError | Self::DatabaseBusy => 2,
            Self::ContextNotFound | Self::SnapshotNotFound | Self::NoActiveSnapshot => 3,
            Self::InvalidArgument => 4,
            Self::MultipleActiveSnapshots => 5,
            Self::ConfigError | Self::MissingCredential => 7,
            Self::IoError | Self::JsonError => 8,
            Self::BackendError | Self::BackendTimeout => 9,
        }
    }

    /// Whether the same call may succeed if simply retried.
    ///
    /// True for lock contention that outlasted the busy timeout and for
    /// backend timeouts. Everything else needs a changed input or a fix.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::DatabaseBusy | Self::BackendTimeout)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in toolz operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Context not found: {id}")]
    ContextNotFound { id: String },

    #[error("Todo snapshot not found: {id}")]
    SnapshotNotFound { id: String },

    #[error("No active todo snapshot for project: {project_path}")]
    NoActiveSnapshot { project_path: String },

    #[error("Found {count} active todo snapshots for project {project_path}; expected at most one")]
    MultipleActiveSnapshots { project_path: String, count: usize },

    #[error("{backend} API key must be provided or set in {env_var} environment variable")]
    MissingCredential {
        backend: Backend,
        env_var: &'static str,
    },

    #[error("{backend} request failed: {message}")]
    Backend { backend: Backend, message: String },

    #[error("{backend} request timed out after {seconds}s")]
    BackendTimeout { backend: Backend, seconds: u64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Database(_) if self.is_lock_contention() => ErrorCode::DatabaseBusy,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::ContextNotFound { .. } => ErrorCode::ContextNotFound,
            Self::SnapshotNotFound { .. } => ErrorCode::SnapshotNotFound,
            Self::NoActiveSnapshot { .. } => ErrorCode::NoActiveSnapshot,
            Self::MultipleActiveSnapshots { .. } => ErrorCode::MultipleActiveSnapshots,
            Self::MissingCredential { .. } => ErrorCode::MissingCredential,
            Self::Backend { .. } => ErrorCode::BackendError,
            Self::BackendTimeout { .. } => ErrorCode::BackendTimeout,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// True when SQLite gave up waiting for another writer's lock.
    #[must_use]
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Shorthand for `error_code().is_retryable()`.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.error_code().is_retryable()
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint for agents and humans.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ContextNotFound { id } => Some(format!(
                "No context with ID '{id}'. Use `toolz context list` to see saved contexts."
            )),
            Self::SnapshotNotFound { id } => Some(format!(
                "No todo snapshot with ID '{id}'. Use `toolz todo list` to see saved snapshots."
            )),
            Self::NoActiveSnapshot { .. } => Some(
                "Save one with `toolz todo save --active` to mark it as the current list."
                    .to_string(),
            ),
            Self::MultipleActiveSnapshots { project_path, .. } => Some(format!(
                "The database holds an inconsistent state for '{project_path}'. \
                 Re-save the intended snapshot with `--active` to repair it."
            )),
            Self::MissingCredential { env_var, .. } => {
                Some(format!("Export {env_var} or pass --api-key."))
            }
            Self::Database(_) if self.is_lock_contention() => Some(
                "Another process is writing to the database. Retry the command.".to_string(),
            ),
            Self::BackendTimeout { .. } => {
                Some("The backend did not answer in time. Retry the command.".to_string())
            }
            Self::InvalidArgument(msg) => {
                if msg.contains("status") {
                    Some(
                        "Valid statuses: pending, in_progress, completed. \
                         Synonyms: todo→pending, wip→in_progress, done→completed"
                            .to_string(),
                    )
                } else if msg.contains("tag") {
                    Some("Tags are stored comma-joined and must not contain ','.".to_string())
                } else {
                    None
                }
            }
            Self::Database(_)
            | Self::Backend { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_error() -> Error {
        Error::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(5), // SQLITE_BUSY
            Some("database is locked".to_string()),
        ))
    }

    #[test]
    fn test_busy_is_retryable() {
        let err = busy_error();
        assert!(err.is_lock_contention());
        assert_eq!(err.error_code(), ErrorCode::DatabaseBusy);
        assert!(err.is_retryable());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_other_database_errors_are_not_retryable() {
        let err = Error::Database(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_lock_contention());
        assert_eq!(err.error_code(), ErrorCode::DatabaseError);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_missing_credential_message() {
        let err = Error::MissingCredential {
            backend: Backend::Claude,
            env_var: "ANTHROPIC_API_KEY",
        };
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        assert_eq!(err.exit_code(), 7);
        assert!(err.hint().unwrap().contains("ANTHROPIC_API_KEY"));

        let gemini = Error::MissingCredential {
            backend: Backend::Gemini,
            env_var: "GOOGLE_API_KEY",
        };
        assert_eq!(
            gemini.to_string(),
            "Google API key must be provided or set in GOOGLE_API_KEY environment variable"
        );
    }

    #[test]
    fn test_structured_json() {
        let err = Error::MultipleActiveSnapshots {
            project_path: "/proj".to_string(),
            count: 2,
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "MULTIPLE_ACTIVE_SNAPSHOTS");
        assert_eq!(json["error"]["exit_code"], 5);
        assert_eq!(json["error"]["retryable"], false);
        assert!(json["error"]["hint"].is_string());
    }
}
