//! Database manager for SQLite storage.
//!
//! The schema is a single script, `migrations/001_initial.sql`, applied on
//! open and tracked with SQLite's `user_version` pragma.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

use reqlog_core::DEFAULT_DB_TABLE;

/// Schema of the default request log table; also the template for
/// custom table names.
const INITIAL_SQL: &str = include_str!("migrations/001_initial.sql");

/// Version stored in `user_version` once the schema is applied.
pub const SCHEMA_VERSION: i64 = 1;

/// SQLite database wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database at the given path, creating it and its parent
    /// directory if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        // WAL lets readers run while a request is being recorded
        conn.pragma_update(None, "journal_mode", "WAL")?;

        debug!("Opened database at {:?}", path);

        let db = Self { conn };
        db.apply_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.apply_schema()?;
        Ok(db)
    }

    fn apply_schema(&self) -> Result<()> {
        if self.schema_version()? >= SCHEMA_VERSION {
            return Ok(());
        }

        self.conn
            .execute_batch(INITIAL_SQL)
            .context("Failed to apply request log schema")?;
        self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        info!("Applied request log schema version {}", SCHEMA_VERSION);
        Ok(())
    }

    /// Schema version recorded in the database file (0 when fresh).
    pub fn schema_version(&self) -> Result<i64> {
        Ok(self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    /// Create a request log table under a custom name, if missing.
    ///
    /// The default table is created with the schema.
    pub fn ensure_request_table(&self, table: &str) -> Result<()> {
        validate_table_name(table)?;
        if table == DEFAULT_DB_TABLE {
            return Ok(());
        }

        self.conn
            .execute_batch(&INITIAL_SQL.replace(DEFAULT_DB_TABLE, table))
            .with_context(|| format!("Failed to create request log table {}", table))?;
        debug!("Ensured request log table {}", table);
        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Table names are interpolated into SQL, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
pub fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("Invalid table name: {:?}", table);
    }
    Ok(())
}
