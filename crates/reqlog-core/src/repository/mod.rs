//! Repository traits for data access
//!
//! The datastore sink is an external collaborator; these traits define the
//! only contract the writer has with it.

use crate::domain::RequestLogRecord;

/// Result type for repository operations
pub type RepoResult<T> = anyhow::Result<T>;

/// Request log repository trait
pub trait RequestLogRepository: Send + Sync {
    /// Insert a single record into `table` (the writer's `db_table`).
    /// Called at most once per save, never retried.
    fn insert(&self, table: &str, record: &RequestLogRecord) -> RepoResult<()>;
}
