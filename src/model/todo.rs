//! Todo list snapshot model.
//!
//! A snapshot is a timestamped copy of a project's task list. At most one
//! snapshot per project is marked active.

use super::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress state of a single todo item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::validate::normalize_todo_status(s)
    }
}

/// One task in a todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// What needs doing.
    pub content: String,

    pub status: TodoStatus,

    /// Present-continuous label shown while the task is in progress.
    #[serde(
        rename = "activeForm",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub active_form: Option<String>,
}

impl Todo {
    pub fn new(content: impl Into<String>, status: TodoStatus) -> Self {
        Self {
            content: content.into(),
            status,
            active_form: None,
        }
    }
}

/// A persisted todo list snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoListSnapshot {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub project_path: String,
    pub git_branch: Option<String>,

    /// Free-text description of what the list is about.
    pub context: Option<String>,

    /// Advisory link to a context entry id. Not enforced by the database.
    pub session_context_id: Option<String>,

    #[serde(default)]
    pub is_active: bool,

    pub todos: Vec<Todo>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl TodoListSnapshot {
    /// Create an inactive snapshot with a fresh id and the current timestamp.
    pub fn new(project_path: impl Into<String>, todos: Vec<Todo>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            project_path: project_path.into(),
            git_branch: None,
            context: None,
            session_context_id: None,
            is_active: false,
            todos,
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn active(mut self) -> Self {
        self.is_active = true;
        self
    }

    /// Count of todos in each status, as (pending, in_progress, completed).
    #[must_use]
    pub fn progress(&self) -> (usize, usize, usize) {
        self.todos
            .iter()
            .fold((0, 0, 0), |(p, i, c), todo| match todo.status {
                TodoStatus::Pending => (p + 1, i, c),
                TodoStatus::InProgress => (p, i + 1, c),
                TodoStatus::Completed => (p, i, c + 1),
            })
    }
}
