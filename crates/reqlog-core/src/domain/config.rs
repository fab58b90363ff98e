//! Log writer configuration
//!
//! Every option has a default so a partial (or empty) JSON document is a
//! valid configuration. Missing or empty values are replaced, never rejected.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{LogError, Result};

/// Default line template: timestamp, category, message.
pub const DEFAULT_FORMAT: &str = "[%s][%s] %s";

/// Default timestamp pattern (ISO 8601 with offset).
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Default rotation threshold: 2 MiB.
pub const DEFAULT_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Default datastore table for the request sink.
pub const DEFAULT_DB_TABLE: &str = "request_log";

/// Name used when `single` is `true` rather than an explicit name.
pub const DEFAULT_SINGLE_NAME: &str = "single";

/// Collapse all output into one named file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SingleFile {
    Enabled(bool),
    Named(String),
}

impl SingleFile {
    /// File stem to use, or `None` when single-file mode is off.
    pub fn name(&self) -> Option<&str> {
        match self {
            SingleFile::Enabled(true) => Some(DEFAULT_SINGLE_NAME),
            SingleFile::Enabled(false) => None,
            SingleFile::Named(name) if name.is_empty() => None,
            SingleFile::Named(name) => Some(name),
        }
    }
}

impl Default for SingleFile {
    fn default() -> Self {
        SingleFile::Enabled(false)
    }
}

/// Which categories are written to their own file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApartLevel {
    All(bool),
    Categories(BTreeSet<String>),
}

impl ApartLevel {
    pub fn categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ApartLevel::Categories(categories.into_iter().map(Into::into).collect())
    }

    /// Whether `category` gets a dedicated file.
    pub fn is_apart(&self, category: &str) -> bool {
        match self {
            ApartLevel::All(all) => *all,
            ApartLevel::Categories(set) => set.contains(category),
        }
    }
}

impl Default for ApartLevel {
    fn default() -> Self {
        ApartLevel::Categories(BTreeSet::new())
    }
}

/// JSON escaping flags for structured output.
///
/// Both default to off: non-ASCII characters and slashes are written as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// Write non-ASCII characters as `\uXXXX` escapes
    pub escape_unicode: bool,
    /// Write `/` as `\/`
    pub escape_slashes: bool,
}

/// Shape of structured output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonLayout {
    /// One object per flush holding request metadata and per-category arrays
    #[default]
    Envelope,
    /// One `{timestamp, category, message}` object per entry
    Lines,
}

/// Configuration snapshot for a `LogWriter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// chrono strftime pattern for timestamps
    pub time_format: String,

    /// Collapse output into one file
    pub single: SingleFile,

    /// Rotation threshold in bytes
    pub file_size: u64,

    /// Base directory for log files
    pub path: PathBuf,

    /// Categories written to their own file
    pub apart_level: ApartLevel,

    /// Maximum retained `*.log` files in the base directory (0 = unbounded)
    pub max_files: usize,

    /// Structured (JSON) output
    pub json: bool,

    pub json_options: JsonOptions,

    pub json_layout: JsonLayout,

    /// Text line template; `%s` placeholders receive timestamp, category, message
    pub format: String,

    /// Datastore table for slow-request records
    pub db_table: String,

    /// Minimum SQL runtime (seconds) recorded by the datastore sink
    pub slow_sql_time: f64,

    /// `app/controller/action` routes excluded from the datastore sink
    pub action_filters: BTreeSet<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            single: SingleFile::default(),
            file_size: DEFAULT_FILE_SIZE,
            path: PathBuf::new(),
            apart_level: ApartLevel::default(),
            max_files: 0,
            json: false,
            json_options: JsonOptions::default(),
            json_layout: JsonLayout::default(),
            format: DEFAULT_FORMAT.to_string(),
            db_table: DEFAULT_DB_TABLE.to_string(),
            slow_sql_time: 0.0,
            action_filters: BTreeSet::new(),
        }
    }
}

impl LogConfig {
    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| LogError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded log configuration from {:?}", path);
        Self::from_json_str(&content)
    }

    /// Apply `REQLOG_*` environment overrides, loading `.env` first if present.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(mut self) -> Self {
        dotenvy::dotenv().ok();

        if let Ok(path) = std::env::var("REQLOG_PATH") {
            self.path = PathBuf::from(path);
        }
        if let Ok(single) = std::env::var("REQLOG_SINGLE") {
            self.single = match single.as_str() {
                "true" | "1" => SingleFile::Enabled(true),
                "false" | "0" | "" => SingleFile::Enabled(false),
                name => SingleFile::Named(name.to_string()),
            };
        }
        if let Some(size) = env_parse::<u64>("REQLOG_FILE_SIZE") {
            self.file_size = size;
        }
        if let Some(max_files) = env_parse::<usize>("REQLOG_MAX_FILES") {
            self.max_files = max_files;
        }
        if let Some(json) = env_parse::<bool>("REQLOG_JSON") {
            self.json = json;
        }
        if let Ok(time_format) = std::env::var("REQLOG_TIME_FORMAT") {
            self.time_format = time_format;
        }
        self
    }

    /// Fill empty values with defaults.
    ///
    /// Called once when a writer is constructed.
    pub fn normalized(mut self) -> Self {
        if self.format.is_empty() {
            self.format = DEFAULT_FORMAT.to_string();
        }
        if self.time_format.is_empty() {
            self.time_format = DEFAULT_TIME_FORMAT.to_string();
        } else if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            warn!("Invalid time_format {:?}, using default", self.time_format);
            self.time_format = DEFAULT_TIME_FORMAT.to_string();
        }
        if self.file_size == 0 {
            self.file_size = DEFAULT_FILE_SIZE;
        }
        if self.path.as_os_str().is_empty() {
            self.path = default_log_dir();
        }
        if self.db_table.is_empty() {
            self.db_table = DEFAULT_DB_TABLE.to_string();
        }
        self
    }

    /// Stem of the single file, if single-file mode is on.
    pub fn single_name(&self) -> Option<&str> {
        self.single.name()
    }
}

/// Platform runtime log directory.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("reqlog").join("log"))
        .unwrap_or_else(|| PathBuf::from("runtime").join("log"))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring unparseable {}={}", key, value);
            None
        }
    }
}
