//! Builds the datastore record for requests with slow SQL.
//!
//! The insert itself belongs to a `RequestLogRepository`; this module only
//! decides whether a record is due and what it contains.

use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::{
    LogBatch, LogConfig, RequestContext, RequestLogRecord, RequestParams, SlowQuery,
    ERROR_CATEGORY, SQL_CATEGORY,
};

lazy_static! {
    static ref RUNTIME_REGEX: Regex = Regex::new(r"RunTime:\s*([0-9]+(?:\.[0-9]+)?)").unwrap();
}

/// Statements that are never reported as slow.
const IGNORED_SQL_MARKERS: &[&str] = &["SHOW FULL COLUMNS", "CONNECT:"];

const CONNECT_MARKER: &str = "CONNECT:";

/// Why no record was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No repository configured
    NoRepository,
    /// Command-line execution
    Cli,
    /// No SQL, no errors and no request parameters
    NothingToRecord,
    /// Route listed in `action_filters`
    Filtered,
    /// No statement reached `slow_sql_time`
    NoSlowQuery,
}

/// Outcome of the datastore sink for one save.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkStatus {
    Skipped(SkipReason),
    Inserted,
    /// Insert failed; never propagated to the file path
    Failed(String),
}

/// Seconds from the last `RunTime:<secs>` marker in a statement.
pub fn parse_sql_runtime(statement: &str) -> Option<f64> {
    RUNTIME_REGEX
        .captures_iter(statement)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Connection description following `CONNECT:`, without the timing bracket.
fn connection_description(statement: &str) -> Option<String> {
    let (_, rest) = statement.split_once(CONNECT_MARKER)?;
    let mut rest = rest.trim_start();
    if rest.starts_with('[') {
        if let Some(end) = rest.find(']') {
            rest = rest[end + 1..].trim_start();
        }
    }
    Some(rest.trim_end().to_string())
}

fn exported(batch: &LogBatch, category: &str) -> Vec<String> {
    batch
        .get(category)
        .map(|entries| entries.iter().map(|entry| entry.export()).collect())
        .unwrap_or_default()
}

/// Decide whether `batch` warrants a datastore record and build it.
pub fn build_request_record(
    batch: &LogBatch,
    context: &RequestContext,
    config: &LogConfig,
    now: DateTime<Local>,
) -> Result<RequestLogRecord, SkipReason> {
    if context.cli {
        return Err(SkipReason::Cli);
    }

    let request = &context.request;
    if !batch.contains(SQL_CATEGORY) && !batch.contains(ERROR_CATEGORY) && !request.has_params() {
        return Err(SkipReason::NothingToRecord);
    }

    if config.action_filters.contains(&request.route()) {
        return Err(SkipReason::Filtered);
    }

    let statements = exported(batch, SQL_CATEGORY);
    let db = statements
        .iter()
        .find_map(|statement| connection_description(statement))
        .unwrap_or_default();

    let mut sql_list = Vec::new();
    let mut runtime_max = 0.0_f64;
    for statement in &statements {
        if IGNORED_SQL_MARKERS.iter().any(|marker| statement.contains(marker)) {
            continue;
        }
        let Some(runtime) = parse_sql_runtime(statement) else {
            continue;
        };
        if runtime >= config.slow_sql_time {
            sql_list.push(SlowQuery {
                db: db.clone(),
                sql: statement.clone(),
                runtime,
            });
            runtime_max = runtime_max.max(runtime);
        }
    }

    if runtime_max <= 0.0 {
        return Err(SkipReason::NoSlowQuery);
    }

    Ok(RequestLogRecord {
        ip: request.ip.clone(),
        method: request.method.clone(),
        host: request.host.clone(),
        uri: request.uri.clone(),
        app: request.app.clone(),
        controller: request.controller.clone(),
        action: request.action.clone(),
        create_time: now.timestamp(),
        create_date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        runtime: runtime_max,
        sql_list,
        param: RequestParams {
            get: request.get.clone(),
            post: request.post.clone(),
            sql: statements,
            error: exported(batch, ERROR_CATEGORY),
        },
    })
}
