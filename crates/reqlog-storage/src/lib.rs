//! Reqlog Storage Layer
//!
//! SQLite implementation of the datastore sink.
//!
//! # Usage
//!
//! ```rust,ignore
//! use reqlog_core::{LogConfig, LogWriter};
//! use reqlog_storage::{Database, SqliteRequestLogRepository};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let db = Arc::new(Mutex::new(Database::open(&path)?));
//! let repo = SqliteRequestLogRepository::new(db);
//!
//! let writer = LogWriter::new(config).with_repository(Arc::new(repo));
//! ```

mod database;
mod repositories;

pub use database::{validate_table_name, Database, SCHEMA_VERSION};
pub use repositories::*;

/// Default database file name.
pub const DATABASE_FILE: &str = "reqlog.db";

/// Get the default database path for the current platform.
pub fn default_database_path() -> Option<std::path::PathBuf> {
    dirs::data_local_dir().map(|p| p.join("reqlog").join(DATABASE_FILE))
}
