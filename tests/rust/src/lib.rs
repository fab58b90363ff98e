//! Shared test utilities and fixtures for Reqlog integration tests.

pub use reqlog_core::{
    LogBatch, LogConfig, LogWriter, RequestContext, RequestInfo, RequestLogRecord,
};

pub use mocks::{FailingRepository, RecordingRepository};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reqlog_core=debug,reqlog_storage=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Test fixture utilities
pub mod fixtures {
    use super::*;
    use chrono::{DateTime, Local, TimeZone};
    use reqlog_core::{FixedClock, StaticProbe};
    use std::path::Path;
    use std::sync::Arc;

    /// Local time on the given day at 09:00
    pub fn day(year: i32, month: u32, day: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(year, month, day, 9, 0, 0)
            .single()
            .expect("valid fixture date")
    }

    /// A GET request routed to `index/Order/list`
    pub fn test_request() -> RequestInfo {
        RequestInfo::new("192.168.1.20", "GET", "shop.test", "/orders?page=2")
            .with_route("index", "Order", "list")
    }

    /// Request context that started at `begin`
    pub fn test_context(begin: DateTime<Local>) -> RequestContext {
        RequestContext::new(test_request(), begin)
    }

    /// Config rooted at `dir` with a readable timestamp format
    pub fn test_config(dir: &Path) -> LogConfig {
        LogConfig {
            path: dir.to_path_buf(),
            time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            ..LogConfig::default()
        }
    }

    /// Writer frozen at `now` with fixed process measurements
    pub fn test_writer(config: LogConfig, now: DateTime<Local>) -> LogWriter {
        LogWriter::new(config)
            .with_clock(Arc::new(FixedClock(now)))
            .with_probe(Arc::new(StaticProbe {
                memory: 8 * 1024 * 1024,
                units: 12,
            }))
    }

    /// A batch with one slow statement, one fast one and a connect line
    pub fn slow_sql_batch() -> LogBatch {
        LogBatch::new()
            .with(
                "sql",
                "[ DB ] CONNECT:[ UseTime:0.000812s ] mysql:host=127.0.0.1;port=3306;dbname=shop",
            )
            .with("sql", "[ SQL ] SELECT * FROM `orders` [ RunTime:0.420000s ]")
            .with("sql", "[ SQL ] SELECT * FROM `users` WHERE id = 1 [ RunTime:0.002000s ]")
            .with("info", "[ LANG ] zh-cn")
    }
}

/// Database test helpers
pub mod db {
    use parking_lot::Mutex;
    use reqlog_storage::Database;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Database file name
    const DB_FILE: &str = "reqlog.db";

    /// Create a temporary database for testing
    pub struct TestDatabase {
        pub db: Database,
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl TestDatabase {
        /// Create a new test database in a temporary directory
        pub fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db_path = temp_dir.path().join(DB_FILE);
            let db = Database::open(&db_path).expect("Failed to open test database");
            Self {
                db,
                db_path,
                _temp_dir: temp_dir,
            }
        }

        pub fn path(&self) -> &Path {
            &self.db_path
        }

        /// Wrap for sharing with repositories
        pub fn shared(self) -> (Arc<Mutex<Database>>, TempDir) {
            (Arc::new(Mutex::new(self.db)), self._temp_dir)
        }
    }

    impl Default for TestDatabase {
        fn default() -> Self {
            Self::new()
        }
    }
}
