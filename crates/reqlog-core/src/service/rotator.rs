//! Destination resolution, size-based rotation, retention and append.
//!
//! Every step reports its outcome instead of raising: the caller decides what
//! ends up in the overall success flag.

use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::domain::LogConfig;
use crate::error::{LogError, Result};

/// Whether a destination is the shared file or a per-category file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationKind {
    Combined,
    Apart { category: String },
}

/// Resolved file path for one write. Computed fresh on every save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub path: PathBuf,
    pub kind: DestinationKind,
}

impl Destination {
    pub fn is_apart(&self) -> bool {
        matches!(self.kind, DestinationKind::Apart { .. })
    }

    /// Directory holding the file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Result of the pre-append size check.
#[derive(Debug)]
pub enum RotationOutcome {
    /// File absent or below the threshold
    NotNeeded,
    /// File renamed to the contained backup path
    Rotated(PathBuf),
    Failed(LogError),
}

/// Result of the `max_files` retention pass.
#[derive(Debug)]
pub enum EvictionOutcome {
    WithinLimit,
    Evicted(PathBuf),
    Failed(LogError),
}

/// Master (combined) destination:
/// - single: `<path>/<name>.log`
/// - `max_files` set: `<path>/<YYYYMMDD>.log`
/// - otherwise: `<path>/<YYYYMM>/<DD>.log`
pub fn master_destination(config: &LogConfig, now: DateTime<Local>) -> Destination {
    let path = if let Some(name) = config.single_name() {
        config.path.join(format!("{}.log", name))
    } else if config.max_files > 0 {
        config.path.join(format!("{}.log", now.format("%Y%m%d")))
    } else {
        config
            .path
            .join(now.format("%Y%m").to_string())
            .join(format!("{}.log", now.format("%d")))
    };

    Destination {
        path,
        kind: DestinationKind::Combined,
    }
}

/// Per-category destination, next to the master file: `<dir>/<name>_<category>.log`
/// where `name` is the single name, `YYYYMMDD`, or the day of month.
pub fn apart_destination(
    config: &LogConfig,
    master: &Destination,
    category: &str,
    now: DateTime<Local>,
) -> Destination {
    let name = if let Some(name) = config.single_name() {
        name.to_string()
    } else if config.max_files > 0 {
        now.format("%Y%m%d").to_string()
    } else {
        now.format("%d").to_string()
    };

    Destination {
        path: master
            .dir()
            .join(format!("{}_{}.log", name, sanitize_category(category))),
        kind: DestinationKind::Apart {
            category: category.to_string(),
        },
    }
}

/// Category names come from application code; path separators and other
/// characters invalid in file names become `_`.
fn sanitize_category(category: &str) -> String {
    category
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Create the directory (and parents) if missing.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| {
        warn!("Failed to create log directory {:?}: {}", dir, source);
        LogError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        }
    })?;
    debug!("Created log directory {:?}", dir);
    Ok(())
}

/// Rename `path` to `<dir>/<unix-timestamp>-<filename>` when its size is at
/// least `max_size` bytes.
pub fn rotate_if_oversized(path: &Path, max_size: u64, now: DateTime<Local>) -> RotationOutcome {
    let size = match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata.len(),
        _ => return RotationOutcome::NotNeeded,
    };
    if size < max_size {
        return RotationOutcome::NotNeeded;
    }

    let Some(file_name) = path.file_name() else {
        return RotationOutcome::NotNeeded;
    };
    let backup = path.with_file_name(format!(
        "{}-{}",
        now.timestamp(),
        file_name.to_string_lossy()
    ));

    match std::fs::rename(path, &backup) {
        Ok(()) => {
            info!("Rotated log file {:?} -> {:?} ({} bytes)", path, backup, size);
            RotationOutcome::Rotated(backup)
        }
        Err(source) => {
            warn!("Failed to rotate log file {:?}: {}", path, source);
            RotationOutcome::Failed(LogError::Rotation {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Delete the first `*.log` file (by filename, ascending) in `dir` when more
/// than `max_files` exist.
///
/// Only the top level of `dir` is considered; at most one file is removed
/// per call.
pub fn evict_oldest(dir: &Path, max_files: usize) -> EvictionOutcome {
    let pattern = dir.join("*.log");
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern_str = Path::new(&escaped).join("*.log");

    let mut files: Vec<PathBuf> = match glob::glob(&pattern_str.to_string_lossy()) {
        Ok(paths) => paths.filter_map(|entry| entry.ok()).filter(|p| p.is_file()).collect(),
        Err(e) => {
            warn!("Invalid log retention pattern {:?}: {}", pattern, e);
            return EvictionOutcome::Failed(LogError::Eviction {
                path: pattern,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
            });
        }
    };

    if files.len() <= max_files {
        return EvictionOutcome::WithinLimit;
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    let oldest = files.swap_remove(0);

    match std::fs::remove_file(&oldest) {
        Ok(()) => {
            debug!("Removed old log file: {:?}", oldest);
            EvictionOutcome::Evicted(oldest)
        }
        Err(source) => {
            warn!("Failed to remove old log file {:?}: {}", oldest, source);
            EvictionOutcome::Failed(LogError::Eviction { path: oldest, source })
        }
    }
}

/// Open-or-create `path` in append mode and write `payload`. Not retried.
pub fn append(path: &Path, payload: &str) -> Result<usize> {
    let to_error = |source: std::io::Error| LogError::Append {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)?;
    file.write_all(payload.as_bytes()).map_err(to_error)?;

    Ok(payload.len())
}
