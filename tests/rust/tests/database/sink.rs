//! Datastore sink wired through the writer

use std::sync::Arc;

use pretty_assertions::assert_eq;
use reqlog_core::{LogBatch, LogConfig, SinkStatus, SkipReason};
use reqlog_storage::SqliteRequestLogRepository;
use tempfile::TempDir;
use tests::db::TestDatabase;
use tests::fixtures::{day, slow_sql_batch, test_config, test_context, test_writer};
use tests::{FailingRepository, RecordingRepository};

fn sink_config(dir: &std::path::Path) -> LogConfig {
    LogConfig {
        slow_sql_time: 0.1,
        ..test_config(dir)
    }
}

#[test]
fn test_slow_request_is_persisted() {
    tests::init_tracing();
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    let (db, _db_dir) = TestDatabase::new().shared();
    let repo = Arc::new(SqliteRequestLogRepository::new(db));

    let writer = test_writer(sink_config(dir.path()), now).with_repository(repo.clone());
    let report = writer.save_with_report(&slow_sql_batch(), &test_context(now), true);

    assert_eq!(report.sink, SinkStatus::Inserted);
    assert!(report.success());
    assert_eq!(repo.count("request_log").unwrap(), 1);

    let record = &repo.list_recent("request_log", 1).unwrap()[0];
    assert_eq!(record.runtime, 0.42);
    assert_eq!(record.sql_list.len(), 1);
    assert_eq!(record.sql_list[0].db, "mysql:host=127.0.0.1;port=3306;dbname=shop");
    assert!(record.sql_list[0].sql.contains("`orders`"));
    assert_eq!(record.param.sql.len(), 3);
    assert_eq!(record.app, "index");
    assert_eq!(record.action, "list");
    assert_eq!(record.create_time, now.timestamp());
}

#[test]
fn test_configured_table_receives_records() {
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    let (db, _db_dir) = TestDatabase::new().shared();
    let repo = Arc::new(SqliteRequestLogRepository::new(db));

    let config = LogConfig {
        db_table: "slow_requests".to_string(),
        ..sink_config(dir.path())
    };
    let report = test_writer(config, now)
        .with_repository(repo.clone())
        .save_with_report(&slow_sql_batch(), &test_context(now), true);

    assert_eq!(report.sink, SinkStatus::Inserted);
    assert_eq!(repo.count("slow_requests").unwrap(), 1);
    assert_eq!(repo.count("request_log").unwrap(), 0);
}

#[test]
fn test_writer_passes_db_table_to_repository() {
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    let repo = Arc::new(RecordingRepository::new());

    let config = LogConfig {
        db_table: "audit_requests".to_string(),
        ..sink_config(dir.path())
    };
    test_writer(config, now)
        .with_repository(repo.clone())
        .save(&slow_sql_batch(), &test_context(now), true);

    assert_eq!(repo.tables(), vec!["audit_requests".to_string()]);
}

#[test]
fn test_invalid_table_reports_sink_failure() {
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    let (db, _db_dir) = TestDatabase::new().shared();

    let config = LogConfig {
        db_table: "bad table".to_string(),
        ..sink_config(dir.path())
    };
    let report = test_writer(config, now)
        .with_repository(Arc::new(SqliteRequestLogRepository::new(db)))
        .save_with_report(&slow_sql_batch(), &test_context(now), true);

    assert!(matches!(report.sink, SinkStatus::Failed(_)));
    assert!(report.success());
}

#[test]
fn test_failing_datastore_does_not_block_file_logging() {
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);

    let writer = test_writer(sink_config(dir.path()), now).with_repository(Arc::new(FailingRepository));
    let report = writer.save_with_report(&slow_sql_batch(), &test_context(now), true);

    match &report.sink {
        SinkStatus::Failed(message) => assert!(message.contains("datastore unavailable")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(report.success());

    let content = std::fs::read_to_string(dir.path().join("202405/01.log")).unwrap();
    assert!(content.contains("[sql] [ SQL ] SELECT * FROM `orders`"));
}

#[test]
fn test_fast_requests_are_not_recorded() {
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    let repo = Arc::new(RecordingRepository::new());
    let config = LogConfig {
        slow_sql_time: 1.0,
        ..test_config(dir.path())
    };

    let report = test_writer(config, now)
        .with_repository(repo.clone())
        .save_with_report(&slow_sql_batch(), &test_context(now), true);

    assert_eq!(report.sink, SinkStatus::Skipped(SkipReason::NoSlowQuery));
    assert!(repo.records().is_empty());
}

#[test]
fn test_cli_and_filtered_routes_are_skipped() {
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    let repo = Arc::new(RecordingRepository::new());

    let writer = test_writer(sink_config(dir.path()), now).with_repository(repo.clone());
    let report = writer.save_with_report(&slow_sql_batch(), &test_context(now).with_cli(true), false);
    assert_eq!(report.sink, SinkStatus::Skipped(SkipReason::Cli));

    let config = LogConfig {
        action_filters: ["index/Order/list".to_string()].into_iter().collect(),
        ..sink_config(dir.path())
    };
    let writer = test_writer(config, now).with_repository(repo.clone());
    let report = writer.save_with_report(&slow_sql_batch(), &test_context(now), false);
    assert_eq!(report.sink, SinkStatus::Skipped(SkipReason::Filtered));

    assert!(repo.records().is_empty());
}

#[test]
fn test_info_only_batch_has_nothing_to_record() {
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    let repo = Arc::new(RecordingRepository::new());

    let report = test_writer(sink_config(dir.path()), now)
        .with_repository(repo.clone())
        .save_with_report(&LogBatch::new().with("info", "ok"), &test_context(now), true);

    assert_eq!(report.sink, SinkStatus::Skipped(SkipReason::NothingToRecord));
    assert!(repo.records().is_empty());
}
