//! Configuration management.
//!
//! This module resolves where the database lives and which project the
//! current invocation belongs to.
//!
//! # Architecture
//!
//! toolz uses a **global database** shared by every project:
//! - **Database**: `~/.mcp-toolz/contexts.db` unless overridden
//! - **Project scoping**: rows carry an absolute `project_path` column
//!
//! Backend credentials and model overrides live in [`crate::opinion::config`].

use std::path::{Path, PathBuf};

/// Environment variable overriding the database location.
pub const DB_ENV: &str = "MCP_TOOLZ_DB";

/// Get the global toolz directory location (`~/.mcp-toolz/`).
#[must_use]
pub fn global_toolz_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".mcp-toolz"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `MCP_TOOLZ_DB` environment variable
/// 3. Global location: `~/.mcp-toolz/contexts.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no home directory
/// can be determined.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    resolve_db_path_with(explicit_path, |key| std::env::var(key).ok())
}

/// [`resolve_db_path`] with an injectable environment lookup.
pub fn resolve_db_path_with<F>(explicit_path: Option<&Path>, env: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    // Priority 1: Explicit path from CLI flag
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: environment override
    if let Some(db_path) = env(DB_ENV) {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    // Priority 3: Global database location
    global_toolz_dir().map(|dir| dir.join("contexts.db"))
}

/// Get the current project path.
///
/// The working directory, canonicalized so that the same project reached
/// through a symlink maps to the same rows.
#[must_use]
pub fn current_project_path() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    Some(cwd.canonicalize().unwrap_or(cwd))
}

/// Get the current git branch name.
///
/// Returns `None` if not in a git repository or if git command fails.
#[must_use]
pub fn current_git_branch() -> Option<String> {
    std::process::Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|branch| !branch.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/db.sqlite");
        let result = resolve_db_path_with(Some(&explicit), |_| Some("/ignored.db".to_string()));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_resolve_db_path_env_override() {
        let result = resolve_db_path_with(None, |key| {
            (key == DB_ENV).then(|| "/tmp/toolz/env.db".to_string())
        });
        assert_eq!(result, Some(PathBuf::from("/tmp/toolz/env.db")));
    }

    #[test]
    fn test_resolve_db_path_blank_env_falls_through() {
        let result = resolve_db_path_with(None, |_| Some("   ".to_string())).unwrap();
        assert!(result.ends_with(".mcp-toolz/contexts.db"));
    }

    #[test]
    fn test_current_project_path_is_absolute() {
        let path = current_project_path().unwrap();
        assert!(path.is_absolute());
    }
}
