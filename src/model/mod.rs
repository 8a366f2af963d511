//! Data models for toolz.
//!
//! This module contains all domain models:
//! - ContextEntry / ContextContent
//! - TodoListSnapshot / Todo
//! - Backend (opinion backend identifiers)

pub mod backend;
pub mod context;
pub mod todo;

pub use backend::Backend;
pub use context::{context_type, ContextContent, ContextEntry, Metadata, SessionSummary};
pub use todo::{Todo, TodoListSnapshot, TodoStatus};
