//! Datastore sink record
//!
//! One row (or document) per request whose SQL crossed the slow threshold.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A SQL statement that ran at or above `slow_sql_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowQuery {
    /// Connection description taken from the batch's `CONNECT:` line
    pub db: String,
    pub sql: String,
    /// Seconds
    pub runtime: f64,
}

/// Request parameters and raw log entries kept alongside the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    pub get: BTreeMap<String, serde_json::Value>,
    pub post: BTreeMap<String, serde_json::Value>,
    pub sql: Vec<String>,
    pub error: Vec<String>,
}

/// Record submitted to the datastore sink.
///
/// Document stores keep `sql_list` and `param` nested; relational stores
/// serialize them to JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestLogRecord {
    pub ip: String,
    pub method: String,
    pub host: String,
    pub uri: String,
    pub app: String,
    pub controller: String,
    pub action: String,
    /// Unix seconds
    pub create_time: i64,
    /// `%Y-%m-%d %H:%M:%S` local time
    pub create_date: String,
    /// Slowest query runtime in seconds
    pub runtime: f64,
    pub sql_list: Vec<SlowQuery>,
    pub param: RequestParams,
}
