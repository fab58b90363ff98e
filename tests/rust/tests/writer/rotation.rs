//! Size-based rotation through the writer

use pretty_assertions::assert_eq;
use reqlog_core::{LogBatch, LogConfig, RotationOutcome, SingleFile};
use tempfile::TempDir;
use tests::fixtures::{day, test_config, test_context, test_writer};

fn single_config(dir: &std::path::Path, file_size: u64) -> LogConfig {
    LogConfig {
        single: SingleFile::Enabled(true),
        file_size,
        ..test_config(dir)
    }
}

#[test]
fn test_oversized_file_is_rotated_before_append() {
    tests::init_tracing();
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    let current = dir.path().join("single.log");
    std::fs::write(&current, "x".repeat(150)).unwrap();

    let writer = test_writer(single_config(dir.path(), 100), now);
    let report = writer.save_with_report(&LogBatch::new().with("info", "fresh"), &test_context(now), false);
    assert!(report.success());

    let backup = dir.path().join(format!("{}-single.log", now.timestamp()));
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "x".repeat(150));

    let fresh = std::fs::read_to_string(&current).unwrap();
    assert!(fresh.contains("[info] fresh"));
    assert!(!fresh.contains("xxx"));
}

#[test]
fn test_exact_threshold_rotates() {
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    std::fs::write(dir.path().join("single.log"), "x".repeat(100)).unwrap();

    let writer = test_writer(single_config(dir.path(), 100), now);
    let report = writer.save_with_report(&LogBatch::new().with("info", "a"), &test_context(now), false);

    assert!(matches!(
        report.combined().unwrap().rotation,
        RotationOutcome::Rotated(_)
    ));
}

#[test]
fn test_below_threshold_appends_in_place() {
    let dir = TempDir::new().unwrap();
    let now = day(2024, 5, 1);
    std::fs::write(dir.path().join("single.log"), "x".repeat(99)).unwrap();

    let writer = test_writer(single_config(dir.path(), 100), now);
    let report = writer.save_with_report(&LogBatch::new().with("info", "a"), &test_context(now), false);

    assert!(matches!(
        report.combined().unwrap().rotation,
        RotationOutcome::NotNeeded
    ));
    let content = std::fs::read_to_string(dir.path().join("single.log")).unwrap();
    assert!(content.starts_with(&"x".repeat(99)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
