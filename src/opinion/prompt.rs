//! Prompt construction shared by every backend.
//!
//! All vendors receive the same markdown rendering of a context entry and
//! one of two system prompts, depending on whether the caller asked a
//! specific question.

use crate::model::ContextEntry;
use chrono::SecondsFormat;

/// System prompt for a general review of the context.
pub const REVIEW_SYSTEM_PROMPT: &str = "You are a senior software engineering consultant \
providing second opinions on code, architecture decisions, and implementation plans.

Your role is to:
- Provide constructive, balanced feedback
- Highlight both strengths and potential issues
- Suggest alternatives when appropriate
- Point out edge cases or security concerns
- Be concise but thorough

Format your response clearly with sections as needed.";

/// System prompt when the caller asks a specific question.
pub const QUESTION_SYSTEM_PROMPT: &str = "You are a senior software engineering consultant \
answering questions about code, architecture decisions, and implementation plans.

Provide clear, actionable answers based on the context provided.";

/// Closing line when no question is given.
pub const DEFAULT_REQUEST: &str = "Please provide a second opinion on the above context.";

/// Pick the system prompt for a request.
#[must_use]
pub fn system_prompt(question: Option<&str>) -> &'static str {
    match question {
        Some(_) => QUESTION_SYSTEM_PROMPT,
        None => REVIEW_SYSTEM_PROMPT,
    }
}

/// Render a context entry as the user message.
#[must_use]
pub fn format_context(entry: &ContextEntry, question: Option<&str>) -> String {
    let mut parts = vec![
        format!("# Context: {}", entry.title),
        format!("\n**Type:** {}", entry.context_type),
        format!(
            "**Timestamp:** {}",
            entry.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        ),
    ];

    if !entry.tags.is_empty() {
        parts.push(format!("**Tags:** {}", entry.tags.join(", ")));
    }

    parts.push("\n## Content\n".to_string());

    let content = &entry.content;
    if let Some(messages) = content.messages.as_ref().filter(|m| !m.is_empty()) {
        parts.push("### Conversation\n".to_string());
        parts.extend(messages.iter().cloned());
    }

    if let Some(code) = content.code.as_ref().filter(|c| !c.is_empty()) {
        parts.push("### Code\n".to_string());
        for (file_path, text) in code {
            parts.push(format!("**File:** `{file_path}`\n```\n{text}\n```\n"));
        }
    }

    if let Some(suggestion) = content.suggestions.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("### Suggestion\n{suggestion}\n"));
    }

    if let Some(errors) = content.errors.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("### Error/Debug Info\n```\n{errors}\n```\n"));
    }

    match question {
        Some(q) => parts.push(format!("\n---\n**Question:** {q}")),
        None => parts.push(format!("\n---\n{DEFAULT_REQUEST}")),
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContextContent;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn sample() -> ContextEntry {
        let mut code = BTreeMap::new();
        code.insert("app.py".to_string(), "print(1)".to_string());
        let content = ContextContent {
            messages: Some(vec!["user: why?".to_string(), "assistant: because".to_string()]),
            code: Some(code),
            suggestions: Some("Use a dict".to_string()),
            errors: Some("KeyError: 'x'".to_string()),
        };
        let mut entry = ContextEntry::new("code", "Lookup bug", content, "/proj")
            .with_tags(["py", "bug"]);
        entry.timestamp = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        entry
    }

    #[test]
    fn test_format_full_context() {
        let text = format_context(&sample(), None);
        let expected = "# Context: Lookup bug
\n**Type:** code
**Timestamp:** 2025-06-01T08:30:00Z
**Tags:** py, bug
\n## Content\n
### Conversation\n
user: why?
assistant: because
### Code\n
**File:** `app.py`
```
print(1)
```\n
### Suggestion
Use a dict\n
### Error/Debug Info
```
KeyError: 'x'
```\n
\n---
Please provide a second opinion on the above context.";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_format_with_question_and_no_tags() {
        let mut entry = sample();
        entry.tags.clear();
        entry.content = ContextContent::default();

        let text = format_context(&entry, Some("Is this thread-safe?"));
        assert!(!text.contains("**Tags:**"));
        assert!(!text.contains("### Code"));
        assert!(text.ends_with("\n---\n**Question:** Is this thread-safe?"));
    }

    #[test]
    fn test_system_prompt_variants() {
        assert!(system_prompt(None).contains("second opinions"));
        assert!(system_prompt(None).contains("- Be concise but thorough"));
        assert!(system_prompt(Some("q")).contains("answering questions"));
    }
}
