//! Error types for the file-logging path

use std::io;
use std::path::PathBuf;

/// Result type for log writer operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Errors that can occur while routing, rotating or appending log output.
///
/// None of these escape `LogWriter::save`; they are recorded in the
/// `SaveReport` so callers and tests can inspect what went wrong.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Failed to create the destination directory
    #[error("Failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// The directory that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to rename an oversized log file
    #[error("Failed to rotate log file {path}: {source}")]
    Rotation {
        /// The file that should have been rotated
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to list or delete retained log files
    #[error("Failed to evict old log file {path}: {source}")]
    Eviction {
        /// The file (or pattern) involved
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to append to the destination
    #[error("Failed to append to log file {path}: {source}")]
    Append {
        /// The destination file
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to read a configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigIo {
        /// The configuration file
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Serialization error
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}
