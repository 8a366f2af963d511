//! SQLite storage layer for toolz.
//!
//! This module provides the persistence layer using SQLite with:
//! - One short-lived connection per operation, shared safely across processes
//! - WAL mode where the filesystem allows it, DELETE mode on cloud-synced paths
//! - IMMEDIATE transactions for read-then-write sequences
//! - Additive column migrations for databases created by older versions
//!
//! # Submodules
//!
//! - [`connection`] - Connection setup (journal mode, busy timeout)
//! - [`schema`] - Database schema definitions
//! - [`migrations`] - Column migrations
//! - [`sqlite`] - Storage handle and row encoding helpers
//! - `contexts` / `todos` - Context entry and todo snapshot operations

pub mod connection;
mod contexts;
pub mod migrations;
pub mod schema;
pub mod sqlite;
mod todos;

pub use connection::{
    configure_connection, is_cloud_synced_path, open_connection, JournalMode, BUSY_TIMEOUT,
    CLOUD_SYNC_INDICATORS,
};
pub use schema::CURRENT_SCHEMA_VERSION;
pub use sqlite::{SqliteStorage, DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT};
