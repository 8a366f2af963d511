//! Additive column migrations.
//!
//! Databases created by older versions lack some response columns. Each
//! migration checks `pragma_table_info` and adds its column when missing,
//! so rows written before the migration read the new column as NULL.

use rusqlite::{Connection, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A column added after the first release.
struct Migration {
    version: &'static str,
    table: &'static str,
    column: &'static str,
    column_type: &'static str,
}

/// All migrations in order.
///
/// The `schema_migrations` table tracks which have been applied.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_contexts_gemini_response",
        table: "contexts",
        column: "gemini_response",
        column_type: "TEXT",
    },
    Migration {
        version: "002_contexts_deepseek_response",
        table: "contexts",
        column: "deepseek_response",
        column_type: "TEXT",
    },
];

/// Run all pending migrations on the database.
///
/// Idempotent and safe to call on every database open. A migration whose
/// column already exists (fresh databases get every column from the base
/// DDL) is recorded without altering the table.
///
/// # Errors
///
/// Returns an error if a column cannot be added or the ledger cannot be
/// written.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Ensure schema_migrations table exists
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Get already applied migrations
    let applied: HashSet<String> = conn
        .prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for migration in MIGRATIONS {
        // The ledger can lag behind a table rebuilt by hand, so the column
        // check runs even for recorded versions.
        if column_exists(conn, migration.table, migration.column)? {
            debug!(version = migration.version, "Column present");
        } else {
            info!(version = migration.version, "Applying migration");
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                migration.table, migration.column, migration.column_type
            );
            match conn.execute_batch(&sql) {
                Ok(()) => info!(version = migration.version, "Migration complete"),
                // Another process added the column between our check and ALTER.
                Err(e) if e.to_string().contains("duplicate column name") => {
                    warn!(version = migration.version, "Column added concurrently");
                }
                Err(e) => return Err(e),
            }
        }

        if !applied.contains(migration.version) {
            conn.execute(
                "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, chrono::Utc::now().timestamp_millis()],
            )?;
        }
    }

    Ok(())
}

/// Check if a column exists in a table.
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM pragma_table_info('{table}') WHERE name = ?1");
    conn.prepare(&sql)?.exists([column])
}
