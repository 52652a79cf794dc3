//! Database schema migrations.
//!
//! Every entity gets its own table with the same superset column layout so
//! the repository can treat them uniformly.

use rusqlite::Connection;
use tracing::info;

use pocket_core::error::{PocketError, Result};
use pocket_core::types::EntityKind;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| PocketError::StorageInit(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| {
            PocketError::StorageInit(format!("Failed to query migration version: {}", e))
        })?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: record_tables");
    }

    Ok(())
}

/// DDL for one entity table.
fn table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            amount      REAL,
            type        TEXT CHECK (type IS NULL OR type IN ('income', 'expense')),
            completed   INTEGER NOT NULL DEFAULT 0,
            createdAt   TEXT NOT NULL,
            updatedAt   TEXT NOT NULL,
            isDeleted   INTEGER NOT NULL DEFAULT 0,
            synced      INTEGER NOT NULL DEFAULT 0,
            cloudId     TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_{table}_listing
            ON {table} (isDeleted, createdAt DESC, id DESC);

        CREATE INDEX IF NOT EXISTS idx_{table}_synced
            ON {table} (synced);
        "
    )
}

/// Version 1: one table per entity.
fn apply_v1(conn: &Connection) -> Result<()> {
    let mut batch = String::new();
    for kind in EntityKind::ALL {
        batch.push_str(&table_ddl(kind.table()));
    }
    batch.push_str(
        "INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'record_tables');",
    );

    conn.execute_batch(&batch)
        .map_err(|e| PocketError::StorageInit(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
