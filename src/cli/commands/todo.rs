//! Todo snapshot command implementations.

use crate::cli::{TodoCommands, TodoSaveArgs};
use crate::config::current_git_branch;
use crate::error::{Error, Result};
use crate::model::{TodoListSnapshot, TodoStatus};
use crate::storage::SqliteStorage;
use crate::validate::{parse_metadata, parse_todo};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use super::{open_storage, resolve_project, truncate};

#[derive(Serialize)]
struct SaveOutput<'a> {
    id: &'a str,
    project_path: &'a str,
    is_active: bool,
    todo_count: usize,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    snapshots: &'a [TodoListSnapshot],
    count: usize,
}

#[derive(Serialize)]
struct DeleteOutput<'a> {
    id: &'a str,
    deleted: bool,
}

/// Execute a todo subcommand.
///
/// # Errors
///
/// Returns `SnapshotNotFound` / `NoActiveSnapshot` when nothing matches,
/// `InvalidArgument` for unparseable todos, or any storage error.
pub fn execute(command: &TodoCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;

    match command {
        TodoCommands::Save(args) => save(&storage, args, json),
        TodoCommands::Get { id } => {
            let snapshot = storage
                .get_todo_snapshot(id)?
                .ok_or_else(|| Error::SnapshotNotFound { id: id.clone() })?;
            print_snapshot(&snapshot, json)
        }
        TodoCommands::Active { project } => {
            let project_path = resolve_project(project.as_deref())?;
            let snapshot = storage
                .get_active_todo_snapshot(&project_path)?
                .ok_or(Error::NoActiveSnapshot { project_path })?;
            print_snapshot(&snapshot, json)
        }
        TodoCommands::List {
            project,
            limit,
            offset,
        } => {
            let snapshots =
                storage.list_todo_snapshots(project.as_deref(), Some(*limit), Some(*offset))?;
            print_snapshots(&snapshots, json, "No todo snapshots found.")
        }
        TodoCommands::Search {
            query,
            project,
            limit,
        } => {
            let snapshots =
                storage.search_todo_snapshots(query, project.as_deref(), Some(*limit))?;
            print_snapshots(&snapshots, json, &format!("No todo snapshots match '{query}'."))
        }
        TodoCommands::Delete { id } => {
            if !storage.delete_todo_snapshot(id)? {
                return Err(Error::SnapshotNotFound { id: id.clone() });
            }
            if json {
                println!("{}", serde_json::to_string(&DeleteOutput { id, deleted: true })?);
            } else {
                println!("Deleted todo snapshot: {id}");
            }
            Ok(())
        }
    }
}

fn build_snapshot(args: &TodoSaveArgs) -> Result<TodoListSnapshot> {
    let todos = args
        .todos
        .iter()
        .map(|t| parse_todo(t))
        .collect::<Result<Vec<_>>>()?;

    let mut snapshot = TodoListSnapshot::new(resolve_project(args.project.as_deref())?, todos);
    snapshot.is_active = args.active;
    snapshot.context.clone_from(&args.context);
    snapshot.session_context_id.clone_from(&args.session_context_id);
    snapshot.git_branch = args.branch.clone().or_else(current_git_branch);
    snapshot.metadata = parse_metadata(&args.metadata)?;
    if let Some(id) = &args.id {
        snapshot.id.clone_from(id);
    }

    Ok(snapshot)
}

fn save(storage: &SqliteStorage, args: &TodoSaveArgs, json: bool) -> Result<()> {
    let snapshot = build_snapshot(args)?;
    debug!(id = %snapshot.id, todos = snapshot.todos.len(), "Saving todo snapshot");
    storage.save_todo_snapshot(&snapshot)?;

    if json {
        let output = SaveOutput {
            id: &snapshot.id,
            project_path: &snapshot.project_path,
            is_active: snapshot.is_active,
            todo_count: snapshot.todos.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        let marker = if snapshot.is_active { " (active)" } else { "" };
        println!(
            "Saved todo snapshot: {} [{} todos]{marker}",
            snapshot.id,
            snapshot.todos.len()
        );
    }

    Ok(())
}

fn status_icon(status: TodoStatus) -> &'static str {
    match status {
        TodoStatus::Pending => "[ ]",
        TodoStatus::InProgress => "[~]",
        TodoStatus::Completed => "[x]",
    }
}

fn print_snapshot(snapshot: &TodoListSnapshot, json: bool) -> Result<()> {
    use colored::Colorize;

    if json {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }

    let (pending, in_progress, completed) = snapshot.progress();
    let title = snapshot.context.as_deref().unwrap_or("Todo list");
    let active = if snapshot.is_active { " (active)" } else { "" };
    println!("{}{}", title.bold(), active.green());
    println!("{}", format!("ID:      {}", snapshot.id).dimmed());
    println!(
        "{}",
        format!("Saved:   {}", snapshot.timestamp.to_rfc3339()).dimmed()
    );
    println!("{}", format!("Project: {}", snapshot.project_path).dimmed());
    if let Some(branch) = &snapshot.git_branch {
        println!("{}", format!("Branch:  {branch}").dimmed());
    }
    println!(
        "{}",
        format!("Progress: {completed} done, {in_progress} in progress, {pending} pending")
            .dimmed()
    );
    println!();

    for todo in &snapshot.todos {
        let line = format!("{} {}", status_icon(todo.status), todo.content);
        match todo.status {
            TodoStatus::Completed => println!("  {}", line.dimmed()),
            TodoStatus::InProgress => println!("  {}", line.yellow()),
            TodoStatus::Pending => println!("  {line}"),
        }
    }

    Ok(())
}

fn print_snapshots(snapshots: &[TodoListSnapshot], json: bool, empty_message: &str) -> Result<()> {
    use colored::Colorize;

    if json {
        let output = ListOutput {
            snapshots,
            count: snapshots.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if snapshots.is_empty() {
        println!("{empty_message}");
        return Ok(());
    }

    println!("Todo snapshots ({} found):", snapshots.len());
    println!();
    for snapshot in snapshots {
        let (_, _, completed) = snapshot.progress();
        let marker = if snapshot.is_active { "*" } else { " " };
        println!(
            "{} {} {} {}",
            marker.green().bold(),
            snapshot.id.dimmed(),
            truncate(snapshot.context.as_deref().unwrap_or("(no description)"), 60),
            format!("{completed}/{} done", snapshot.todos.len()).dimmed()
        );
    }

    Ok(())
}
