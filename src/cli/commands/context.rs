//! Context entry command implementations (save, get, list, search, delete,
//! tags, sessions, session).

use crate::cli::{ContextCommands, ContextSaveArgs};
use crate::error::{Error, Result};
use crate::model::{ContextContent, ContextEntry, SessionSummary};
use crate::storage::SqliteStorage;
use crate::validate::{parse_metadata, parse_tag_list};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use super::{open_storage, resolve_project, truncate};

/// Output for save command.
#[derive(Serialize)]
struct SaveOutput<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    context_type: &'a str,
    title: &'a str,
    project_path: &'a str,
}

/// Output for list-style commands.
#[derive(Serialize)]
struct ListOutput<'a> {
    contexts: &'a [ContextEntry],
    count: usize,
}

#[derive(Serialize)]
struct SessionsOutput<'a> {
    project_path: &'a str,
    sessions: &'a [SessionSummary],
    count: usize,
}

/// Output for delete command.
#[derive(Serialize)]
struct DeleteOutput<'a> {
    id: &'a str,
    deleted: bool,
}

/// Execute a context subcommand.
///
/// # Errors
///
/// Returns `ContextNotFound` for unknown ids, or any storage error.
pub fn execute(command: &ContextCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;

    match command {
        ContextCommands::Save(args) => save(&storage, args, json),
        ContextCommands::Get { id } => get(&storage, id, json),
        ContextCommands::List {
            context_type,
            project,
            limit,
            offset,
        } => {
            let entries = storage.list_contexts(
                context_type.as_deref(),
                project.as_deref(),
                Some(*limit),
                Some(*offset),
            )?;
            print_entries(&entries, json, "No contexts found.")
        }
        ContextCommands::Search {
            query,
            context_type,
            limit,
        } => {
            let entries = storage.search_contexts(query, context_type.as_deref(), Some(*limit))?;
            print_entries(&entries, json, &format!("No contexts match '{query}'."))
        }
        ContextCommands::Delete { id } => delete(&storage, id, json),
        ContextCommands::Tags { tags, limit } => {
            let tags = parse_tag_list(tags);
            let entries = storage.get_contexts_by_tags(&tags, Some(*limit))?;
            print_entries(&entries, json, "No contexts carry those tags.")
        }
        ContextCommands::Sessions { project, limit } => {
            sessions(&storage, project.as_deref(), *limit, json)
        }
        ContextCommands::Session { session_id } => {
            let entries = storage.get_session_contexts(session_id)?;
            print_entries(
                &entries,
                json,
                &format!("No contexts in session '{session_id}'."),
            )
        }
    }
}

/// Build the entry described by `args`, reading any `--code` files.
fn build_entry(args: &ContextSaveArgs) -> Result<ContextEntry> {
    let mut code = BTreeMap::new();
    for path in &args.code {
        let text = std::fs::read_to_string(path)?;
        code.insert(path.display().to_string(), text);
    }

    let content = ContextContent {
        messages: (!args.messages.is_empty()).then(|| args.messages.clone()),
        code: (!code.is_empty()).then_some(code),
        suggestions: args.suggestion.clone(),
        errors: args.error.clone(),
    };

    let project = resolve_project(args.project.as_deref())?;
    let mut entry = ContextEntry::new(&args.context_type, &args.title, content, project)
        .with_metadata(parse_metadata(&args.metadata)?);

    if let Some(tags) = &args.tags {
        entry = entry.with_tags(parse_tag_list(tags));
    }
    if let Some(session_id) = &args.session_id {
        entry = entry.with_session(session_id, Utc::now());
    }
    if let Some(id) = &args.id {
        entry.id.clone_from(id);
    }

    Ok(entry)
}

fn save(storage: &SqliteStorage, args: &ContextSaveArgs, json: bool) -> Result<()> {
    let entry = build_entry(args)?;
    if entry.content.is_empty() {
        return Err(Error::InvalidArgument(
            "Context has no content: pass --message, --code, --suggestion or --error".to_string(),
        ));
    }

    debug!(id = %entry.id, context_type = %entry.context_type, "Saving context");
    storage.save_context(&entry)?;

    if json {
        let output = SaveOutput {
            id: &entry.id,
            context_type: &entry.context_type,
            title: &entry.title,
            project_path: &entry.project_path,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Saved: {} [{}] {}", entry.id, entry.context_type, entry.title);
    }

    Ok(())
}

fn get(storage: &SqliteStorage, id: &str, json: bool) -> Result<()> {
    let entry = storage
        .get_context(id)?
        .ok_or_else(|| Error::ContextNotFound { id: id.to_string() })?;

    if json {
        println!("{}", serde_json::to_string(&entry)?);
    } else {
        print_entry_detail(&entry);
    }

    Ok(())
}

fn delete(storage: &SqliteStorage, id: &str, json: bool) -> Result<()> {
    let deleted = storage.delete_context(id)?;
    if !deleted {
        return Err(Error::ContextNotFound { id: id.to_string() });
    }

    if json {
        println!("{}", serde_json::to_string(&DeleteOutput { id, deleted })?);
    } else {
        println!("Deleted context: {id}");
    }

    Ok(())
}

fn sessions(
    storage: &SqliteStorage,
    project: Option<&str>,
    limit: u32,
    json: bool,
) -> Result<()> {
    use colored::Colorize;

    let project_path = resolve_project(project)?;
    let sessions = storage.list_sessions(&project_path, Some(limit))?;

    if json {
        let output = SessionsOutput {
            project_path: &project_path,
            sessions: &sessions,
            count: sessions.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions for {project_path}.");
        return Ok(());
    }

    println!("Sessions for {} ({}):", project_path.bold(), sessions.len());
    for session in &sessions {
        println!(
            "  {} {} {}",
            session.session_id.cyan(),
            format!("{} contexts", session.context_count).dimmed(),
            format!(
                "{} .. {}",
                session.first_context.format("%Y-%m-%d %H:%M"),
                session.last_context.format("%Y-%m-%d %H:%M")
            )
            .dimmed()
        );
    }

    Ok(())
}

fn print_entries(entries: &[ContextEntry], json: bool, empty_message: &str) -> Result<()> {
    use colored::Colorize;

    if json {
        let output = ListOutput {
            contexts: entries,
            count: entries.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{empty_message}");
        return Ok(());
    }

    println!("Contexts ({} found):", entries.len());
    println!();
    for entry in entries {
        let answered: Vec<&str> = entry.answered_by().iter().map(|b| b.as_str()).collect();
        println!(
            "{} {} {}",
            entry.id.dimmed(),
            format!("[{}]", entry.context_type).cyan(),
            truncate(&entry.title, 80).bold()
        );
        let mut details = vec![entry.timestamp.format("%Y-%m-%d %H:%M").to_string()];
        if !entry.tags.is_empty() {
            details.push(format!("tags: {}", entry.tags.join(", ")));
        }
        if !answered.is_empty() {
            details.push(format!("answered: {}", answered.join(", ")));
        }
        println!("    {}", details.join("  ").dimmed());
    }

    Ok(())
}

fn print_entry_detail(entry: &ContextEntry) {
    use colored::Colorize;

    println!("{} {}", entry.title.bold(), format!("[{}]", entry.context_type).cyan());
    println!("{}", format!("ID:      {}", entry.id).dimmed());
    println!(
        "{}",
        format!("Created: {}", entry.timestamp.to_rfc3339()).dimmed()
    );
    println!("{}", format!("Project: {}", entry.project_path).dimmed());
    if let Some(session_id) = &entry.session_id {
        println!("{}", format!("Session: {session_id}").dimmed());
    }
    if !entry.tags.is_empty() {
        println!("{}", format!("Tags:    {}", entry.tags.join(", ")).dimmed());
    }
    if !entry.metadata.is_empty() {
        let metadata = serde_json::to_string(&entry.metadata).unwrap_or_default();
        println!("{}", format!("Meta:    {metadata}").dimmed());
    }

    let content = &entry.content;
    if let Some(messages) = &content.messages {
        println!();
        println!("{}", "Messages".yellow().bold());
        for message in messages {
            println!("  {message}");
        }
    }
    if let Some(code) = &content.code {
        for (path, text) in code {
            println!();
            println!("{}", path.yellow().bold());
            println!("{text}");
        }
    }
    if let Some(suggestion) = &content.suggestions {
        println!();
        println!("{}", "Suggestion".yellow().bold());
        println!("  {suggestion}");
    }
    if let Some(errors) = &content.errors {
        println!();
        println!("{}", "Errors".red().bold());
        println!("  {errors}");
    }

    for backend in entry.answered_by() {
        if let Some(response) = entry.response(backend) {
            println!();
            println!("{}", format!("{} says", backend.display_name()).green().bold());
            println!("{response}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::context_type;
    use std::io::Write;

    fn save_args(title: &str) -> ContextSaveArgs {
        ContextSaveArgs {
            title: title.to_string(),
            context_type: context_type::CODE.to_string(),
            messages: Vec::new(),
            code: Vec::new(),
            suggestion: None,
            error: None,
            tags: Some("rust, db".to_string()),
            session_id: Some("s-1".to_string()),
            metadata: vec!["priority=2".to_string()],
            project: Some("/proj".to_string()),
            id: Some("c1".to_string()),
        }
    }

    #[test]
    fn test_build_entry_reads_code_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "fn main() {{}}").unwrap();

        let mut args = save_args("Parser");
        args.code = vec![file.path().to_path_buf()];
        let entry = build_entry(&args).unwrap();

        assert_eq!(entry.id, "c1");
        assert_eq!(entry.tags, vec!["rust", "db"]);
        assert_eq!(entry.session_id.as_deref(), Some("s-1"));
        assert!(entry.session_timestamp.is_some());
        assert_eq!(entry.metadata["priority"], serde_json::json!(2));
        let code = entry.content.code.unwrap();
        assert_eq!(code[&file.path().display().to_string()], "fn main() {}");
    }

    #[test]
    fn test_save_rejects_empty_content() {
        let temp = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(&temp.path().join("t.db")).unwrap();
        let err = save(&storage, &save_args("Empty"), true).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(storage.get_context("c1").unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut args = save_args("Missing");
        args.code = vec![PathBuf::from("/definitely/not/here.rs")];
        assert!(matches!(build_entry(&args).unwrap_err(), Error::Io(_)));
    }

    #[test]
    fn test_get_and_delete_unknown_id() {
        let temp = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(&temp.path().join("t.db")).unwrap();
        assert!(matches!(
            get(&storage, "nope", true).unwrap_err(),
            Error::ContextNotFound { .. }
        ));
        assert!(matches!(
            delete(&storage, "nope", true).unwrap_err(),
            Error::ContextNotFound { .. }
        ));
    }
}
