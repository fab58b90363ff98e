//! Schema tests

use reqlog_core::{RequestLogRecord, RequestLogRepository};
use reqlog_storage::{Database, SqliteRequestLogRepository, SCHEMA_VERSION};
use tests::db::TestDatabase;

fn table_exists(db: &Database, table: &str) -> bool {
    db.connection()
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )
        .unwrap()
}

#[test]
fn test_schema_creates_request_table() {
    let test_db = TestDatabase::new();

    assert!(test_db.path().exists());
    assert!(table_exists(&test_db.db, "request_log"));
    assert_eq!(test_db.db.schema_version().unwrap(), SCHEMA_VERSION);
}

#[test]
fn test_schema_is_idempotent() {
    let test_db = TestDatabase::new();

    let reopened = Database::open(test_db.path());
    assert!(reopened.is_ok());
}

#[test]
fn test_database_creates_parent_directories() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("runtime").join("reqlog.db");

    assert!(!db_path.exists());
    let _db = Database::open(&db_path).expect("Failed to open database");
    assert!(db_path.exists());
}

#[test]
fn test_repository_rejects_unsafe_table_name() {
    let (db, _dir) = TestDatabase::new().shared();

    let repo = SqliteRequestLogRepository::new(db.clone());

    let result = repo.insert("log; DROP TABLE request_log", &RequestLogRecord::default());
    assert!(result.is_err());
    assert!(table_exists(&db.lock(), "request_log"));
}
