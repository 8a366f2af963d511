//! Input validation for agent ergonomics.
//!
//! Tags, todo statuses and `key=value` metadata arrive as loose text from
//! agents and shells. Statuses use three-tier resolution: exact match →
//! synonym lookup → error with suggestion.

use crate::error::{Error, Result};
use crate::model::{Metadata, Todo, TodoStatus};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Delimiter used to store tags in a single column.
pub const TAG_DELIMITER: char = ',';

// ── Synonym map (agent typo recovery) ────────────────────────

pub static TODO_STATUS_SYNONYMS: LazyLock<HashMap<&str, TodoStatus>> = LazyLock::new(|| {
    [
        ("todo", TodoStatus::Pending),
        ("open", TodoStatus::Pending),
        ("new", TodoStatus::Pending),
        ("waiting", TodoStatus::Pending),
        ("wip", TodoStatus::InProgress),
        ("active", TodoStatus::InProgress),
        ("working", TodoStatus::InProgress),
        ("started", TodoStatus::InProgress),
        ("in-progress", TodoStatus::InProgress),
        ("inprogress", TodoStatus::InProgress),
        ("done", TodoStatus::Completed),
        ("complete", TodoStatus::Completed),
        ("finished", TodoStatus::Completed),
        ("closed", TodoStatus::Completed),
    ]
    .into_iter()
    .collect()
});

const TODO_STATUSES: [TodoStatus; 3] = [
    TodoStatus::Pending,
    TodoStatus::InProgress,
    TodoStatus::Completed,
];

/// Normalize a todo status via exact match or synonym lookup.
///
/// # Errors
///
/// Returns `InvalidArgument` naming the closest valid status when one is
/// within edit distance 3.
pub fn normalize_todo_status(input: &str) -> Result<TodoStatus> {
    let lower = input.trim().to_lowercase();

    // Tier 1: exact match
    if let Some(status) = TODO_STATUSES.iter().find(|s| s.as_str() == lower) {
        return Ok(*status);
    }

    // Tier 2: synonym lookup
    if let Some(&status) = TODO_STATUS_SYNONYMS.get(lower.as_str()) {
        return Ok(status);
    }

    // Tier 3: closest suggestion
    let suggestion = TODO_STATUSES
        .iter()
        .map(|s| (s.as_str(), *s))
        .chain(TODO_STATUS_SYNONYMS.iter().map(|(k, v)| (*k, *v)))
        .map(|(name, status)| (levenshtein_distance(&lower, name), status))
        .filter(|(dist, _)| *dist <= 3)
        .min_by_key(|(dist, _)| *dist);

    let msg = match suggestion {
        Some((_, status)) => format!("unknown todo status '{input}' (did you mean '{status}'?)"),
        None => format!("unknown todo status '{input}'"),
    };
    Err(Error::InvalidArgument(msg))
}

/// Reject tags that would not survive the comma-joined column.
///
/// # Errors
///
/// Returns `InvalidArgument` for empty tags or tags containing the delimiter.
pub fn validate_tags(tags: &[String]) -> Result<()> {
    for tag in tags {
        if tag.is_empty() {
            return Err(Error::InvalidArgument("tag must not be empty".to_string()));
        }
        if tag.contains(TAG_DELIMITER) {
            return Err(Error::InvalidArgument(format!(
                "tag '{tag}' contains the delimiter '{TAG_DELIMITER}'"
            )));
        }
    }
    Ok(())
}

/// Split user input like `"rust, parser,,db"` into trimmed, non-empty tags.
#[must_use]
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse `key=value` pairs into metadata.
///
/// Values that parse as JSON (numbers, booleans, objects) are kept
/// structured; anything else is stored as a string.
///
/// # Errors
///
/// Returns `InvalidArgument` when a pair has no `=` or an empty key.
pub fn parse_metadata(pairs: &[String]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::InvalidArgument(format!("metadata '{pair}' must be key=value"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "metadata '{pair}' has an empty key"
            )));
        }
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        metadata.insert(key.to_string(), value);
    }
    Ok(metadata)
}

/// Parse a todo written as `status:content`, or bare `content` (pending).
///
/// # Errors
///
/// Returns `InvalidArgument` for an empty description or unknown status.
pub fn parse_todo(input: &str) -> Result<Todo> {
    let (status, content) = match input.split_once(':') {
        Some((prefix, rest)) if normalize_todo_status(prefix).is_ok() => {
            (normalize_todo_status(prefix)?, rest.trim())
        }
        _ => (TodoStatus::Pending, input.trim()),
    };

    if content.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "todo '{input}' has no description"
        )));
    }

    Ok(Todo::new(content, status))
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Use single-row optimization (O(min(m,n)) space)
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}
