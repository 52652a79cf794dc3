//! Record Store: database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex. The store is built once
//! by the composition root and handed to repositories behind an `Arc`.
//! Every call to `execute` or `query` is one statement that commits on its
//! own; nothing here opens a transaction spanning calls.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::Connection;
use tracing::{debug, info};

use pocket_core::error::{PocketError, Result};

use crate::migrations;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Outcome of a mutating statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    /// Rows changed by the statement.
    pub affected: usize,
    /// Row id assigned by an `INSERT`; `None` for other statements.
    pub last_insert_id: Option<i64>,
}

/// One result row as a column name → value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row(iter.into_iter().collect())
    }
}

/// SQLite-backed record store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path and make sure the
    /// schema exists.
    pub fn new(path: &Path) -> Result<Self> {
        Self::open(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Like [`Database::new`] with an explicit lock wait.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PocketError::StorageInit(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| PocketError::StorageInit(format!("Failed to open database: {}", e)))?;

        conn.busy_timeout(busy_timeout)
            .map_err(|e| PocketError::StorageInit(format!("Failed to set busy timeout: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| PocketError::StorageInit(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            PocketError::StorageInit(format!("Failed to open in-memory db: {}", e))
        })?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| PocketError::StorageInit(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Create the tables if they are absent. Safe to call any number of
    /// times.
    pub fn initialize(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PocketError::StorageInit(format!("Database lock poisoned: {}", e)))?;
        migrations::run_migrations(&conn)
    }

    /// Run a mutating statement.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<Execution> {
        self.with_conn(|conn| execute_on(conn, sql, params))
    }

    /// Run a read statement. Returns an empty `Vec` when nothing matches.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.with_conn(|conn| query_on(conn, sql, params))
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PocketError::Query(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

/// `execute` against an already-locked connection.
pub(crate) fn execute_on(conn: &Connection, sql: &str, params: &[Value]) -> Result<Execution> {
    debug!(sql, params = params.len(), "execute");
    let affected = conn
        .execute(sql, rusqlite::params_from_iter(params.iter()))
        .map_err(|e| PocketError::Query(e.to_string()))?;

    let is_insert = sql
        .trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"));

    // last_insert_rowid() keeps the previous id when nothing was inserted.
    Ok(Execution {
        affected,
        last_insert_id: (is_insert && affected > 0).then(|| conn.last_insert_rowid()),
    })
}

/// `query` against an already-locked connection.
pub(crate) fn query_on(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
    debug!(sql, params = params.len(), "query");
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| PocketError::Query(e.to_string()))?;

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            let mut values = Vec::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                values.push((name.clone(), row.get::<_, Value>(i)?));
            }
            Ok(values.into_iter().collect::<Row>())
        })
        .map_err(|e| PocketError::Query(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| PocketError::Query(e.to_string()))?);
    }
    Ok(results)
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
