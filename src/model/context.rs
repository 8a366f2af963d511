//! Context entry model.
//!
//! A context entry captures one unit of work context (a conversation, some
//! code, a suggestion or an error) plus the responses collected from each
//! opinion backend.

use super::Backend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open key/value mapping stored as opaque JSON.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Well-known context types. The column is free text; these are conventions.
pub mod context_type {
    pub const CONVERSATION: &str = "conversation";
    pub const CODE: &str = "code";
    pub const SUGGESTION: &str = "suggestion";
    pub const ERROR: &str = "error";

    /// All well-known types, for help text and shell completion.
    pub const ALL: [&str; 4] = [CONVERSATION, CODE, SUGGESTION, ERROR];
}

/// The payload of a context entry. Any combination of fields may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextContent {
    /// Conversation messages, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<String>>,

    /// File path → code text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<BTreeMap<String, String>>,

    /// Free-text suggestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,

    /// Error output or debug information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl ContextContent {
    /// True when no field is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.as_ref().is_none_or(Vec::is_empty)
            && self.code.as_ref().is_none_or(BTreeMap::is_empty)
            && self.suggestions.is_none()
            && self.errors.is_none()
    }
}

/// A persisted context entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Unique identifier (UUID by default).
    pub id: String,

    /// Creation instant.
    pub timestamp: DateTime<Utc>,

    /// Kind of context; see [`context_type`].
    #[serde(rename = "type")]
    pub context_type: String,

    pub title: String,

    pub content: ContextContent,

    /// Tags in display order.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Owning project (absolute path).
    pub project_path: String,

    pub session_id: Option<String>,
    pub session_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub metadata: Metadata,

    pub chatgpt_response: Option<String>,
    pub claude_response: Option<String>,
    pub gemini_response: Option<String>,
    pub deepseek_response: Option<String>,
}

impl ContextEntry {
    /// Create a new entry with a fresh id and the current timestamp.
    pub fn new(
        context_type: impl Into<String>,
        title: impl Into<String>,
        content: ContextContent,
        project_path: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            context_type: context_type.into(),
            title: title.into(),
            content,
            tags: Vec::new(),
            project_path: project_path.into(),
            session_id: None,
            session_timestamp: None,
            metadata: Metadata::new(),
            chatgpt_response: None,
            claude_response: None,
            gemini_response: None,
            deepseek_response: None,
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>, started: DateTime<Utc>) -> Self {
        self.session_id = Some(session_id.into());
        self.session_timestamp = Some(started);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The stored response from `backend`, if any.
    #[must_use]
    pub fn response(&self, backend: Backend) -> Option<&str> {
        match backend {
            Backend::ChatGpt => self.chatgpt_response.as_deref(),
            Backend::Claude => self.claude_response.as_deref(),
            Backend::Gemini => self.gemini_response.as_deref(),
            Backend::DeepSeek => self.deepseek_response.as_deref(),
        }
    }

    /// Backends that have answered for this entry.
    #[must_use]
    pub fn answered_by(&self) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|b| self.response(*b).is_some())
            .collect()
    }
}

/// One row of `list_sessions`: entries grouped by session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// Latest session timestamp seen in the group.
    pub session_timestamp: Option<DateTime<Utc>>,
    pub context_count: i64,
    pub first_context: DateTime<Utc>,
    pub last_context: DateTime<Utc>,
}
