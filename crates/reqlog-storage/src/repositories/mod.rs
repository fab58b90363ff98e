//! SQLite repository implementations.

mod request_log_repository;

pub use request_log_repository::SqliteRequestLogRepository;
