//! mcp-toolz - shared context store for AI coding agents
//!
//! This crate provides the core functionality behind the `toolz` CLI: a
//! SQLite-backed store of context entries and todo list snapshots that
//! several agent processes can share, plus second opinions on saved
//! contexts from ChatGPT, Claude, Gemini and DeepSeek.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (`ContextEntry`, `TodoListSnapshot`, `Backend`)
//! - [`storage`] - SQLite database layer
//! - [`opinion`] - LLM opinion backends
//! - [`config`] - Database path and project resolution
//! - [`validate`] - Parsing of loose agent input (tags, statuses, metadata)
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod opinion;
pub mod storage;
pub mod validate;

pub use error::{Error, Result};
