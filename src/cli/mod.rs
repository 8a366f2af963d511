//! CLI definitions using clap.

use crate::model::Backend;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// toolz - persistent context and todo store with second opinions
#[derive(Parser, Debug)]
#[command(name = "toolz", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.mcp-toolz/contexts.db)
    #[arg(long, global = true, env = "MCP_TOOLZ_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON (for agent integration)
    #[arg(long, alias = "robot", global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Context entries (conversations, code, suggestions, errors)
    Context {
        #[command(subcommand)]
        command: ContextCommands,
    },

    /// Todo list snapshots
    Todo {
        #[command(subcommand)]
        command: TodoCommands,
    },

    /// Ask a backend for a second opinion on a context entry
    Ask(AskArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Context Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ContextCommands {
    /// Save a context entry
    Save(ContextSaveArgs),

    /// Show a context entry with any stored responses
    Get {
        /// Context ID
        id: String,
    },

    /// List context entries, newest first
    List {
        /// Filter by type (conversation, code, suggestion, error)
        #[arg(short = 't', long = "type")]
        context_type: Option<String>,

        /// Filter by project path
        #[arg(long)]
        project: Option<String>,

        /// Maximum entries to return
        #[arg(short, long, default_value_t = crate::storage::DEFAULT_LIST_LIMIT)]
        limit: u32,

        /// Entries to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Search titles, content, and tags
    Search {
        /// Text to look for
        query: String,

        /// Filter by type
        #[arg(short = 't', long = "type")]
        context_type: Option<String>,

        /// Maximum entries to return
        #[arg(short, long, default_value_t = crate::storage::DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },

    /// Delete a context entry
    Delete {
        /// Context ID
        id: String,
    },

    /// Find entries carrying any of the given tags
    Tags {
        /// Comma-separated tags
        tags: String,

        /// Maximum entries to return
        #[arg(short, long, default_value_t = crate::storage::DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },

    /// List sessions recorded for a project
    Sessions {
        /// Project path (default: current directory)
        #[arg(long)]
        project: Option<String>,

        /// Maximum sessions to return
        #[arg(short, long, default_value_t = crate::storage::DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },

    /// Show every entry of one session, oldest first
    Session {
        /// Session ID
        session_id: String,
    },
}

#[derive(Args, Debug)]
pub struct ContextSaveArgs {
    /// Title of the entry
    pub title: String,

    /// Kind of context (conversation, code, suggestion, error)
    #[arg(short = 't', long = "type", default_value = crate::model::context_type::CONVERSATION)]
    pub context_type: String,

    /// Conversation message (repeatable, kept in order)
    #[arg(short, long = "message")]
    pub messages: Vec<String>,

    /// Source file to include (repeatable)
    #[arg(short, long = "code")]
    pub code: Vec<PathBuf>,

    /// Suggestion text
    #[arg(short, long)]
    pub suggestion: Option<String>,

    /// Error output or debug info
    #[arg(short, long)]
    pub error: Option<String>,

    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,

    /// Session this entry belongs to
    #[arg(long)]
    pub session_id: Option<String>,

    /// Metadata as key=value (repeatable; JSON values are kept typed)
    #[arg(long = "meta")]
    pub metadata: Vec<String>,

    /// Project path (default: current directory)
    #[arg(long)]
    pub project: Option<String>,

    /// Explicit ID; saving an existing ID replaces that entry
    #[arg(long)]
    pub id: Option<String>,
}

// ============================================================================
// Todo Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TodoCommands {
    /// Save a todo list snapshot
    Save(TodoSaveArgs),

    /// Show a todo snapshot
    Get {
        /// Snapshot ID
        id: String,
    },

    /// Show the active snapshot of a project
    Active {
        /// Project path (default: current directory)
        #[arg(long)]
        project: Option<String>,
    },

    /// List todo snapshots, newest first
    List {
        /// Filter by project path
        #[arg(long)]
        project: Option<String>,

        /// Maximum snapshots to return
        #[arg(short, long, default_value_t = crate::storage::DEFAULT_LIST_LIMIT)]
        limit: u32,

        /// Snapshots to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Search todo text and snapshot descriptions
    Search {
        /// Text to look for
        query: String,

        /// Filter by project path
        #[arg(long)]
        project: Option<String>,

        /// Maximum snapshots to return
        #[arg(short, long, default_value_t = crate::storage::DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },

    /// Delete a todo snapshot
    Delete {
        /// Snapshot ID
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct TodoSaveArgs {
    /// Todos as "status:description" or plain "description" (pending)
    #[arg(required = true)]
    pub todos: Vec<String>,

    /// Mark this snapshot as the project's active list
    #[arg(short, long)]
    pub active: bool,

    /// What the list is about
    #[arg(short, long)]
    pub context: Option<String>,

    /// Git branch (default: current branch)
    #[arg(long)]
    pub branch: Option<String>,

    /// Context entry this list relates to
    #[arg(long)]
    pub session_context_id: Option<String>,

    /// Metadata as key=value (repeatable)
    #[arg(long = "meta")]
    pub metadata: Vec<String>,

    /// Project path (default: current directory)
    #[arg(long)]
    pub project: Option<String>,

    /// Explicit ID; saving an existing ID replaces that snapshot
    #[arg(long)]
    pub id: Option<String>,
}

// ============================================================================
// Ask
// ============================================================================

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Context ID to review
    pub id: String,

    /// Backend to ask (chatgpt, claude, gemini, deepseek)
    #[arg(short, long, default_value = "chatgpt")]
    pub backend: Backend,

    /// Specific question instead of a general review
    #[arg(long)]
    pub question: Option<String>,

    /// Model override
    #[arg(short, long)]
    pub model: Option<String>,

    /// API key (default: the backend's environment variable)
    #[arg(long)]
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from([
            "toolz", "ask", "c1", "--backend", "claude", "-q", "--question", "Why?",
        ]);
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.backend, Backend::Claude);
                assert_eq!(args.question.as_deref(), Some("Why?"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.quiet);
    }

    #[test]
    fn test_parse_todo_save() {
        let cli = Cli::parse_from([
            "toolz", "todo", "save", "--active", "done:Write parser", "Ship it",
        ]);
        let Commands::Todo {
            command: TodoCommands::Save(args),
        } = cli.command
        else {
            panic!("expected todo save");
        };
        assert!(args.active);
        assert_eq!(args.todos, vec!["done:Write parser", "Ship it"]);
    }
}
