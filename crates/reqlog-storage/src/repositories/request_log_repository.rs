//! SQLite implementation of RequestLogRepository.
//!
//! `sql_list` and `param` are stored as JSON text columns. The target table
//! comes from each insert and is created on first use.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use reqlog_core::{RepoResult, RequestLogRecord, RequestLogRepository};
use rusqlite::{params, Row};

use crate::Database;

/// SQLite-backed request log repository.
pub struct SqliteRequestLogRepository {
    db: Arc<Mutex<Database>>,
    /// Tables already ensured on this connection
    tables: Mutex<BTreeSet<String>>,
}

impl SqliteRequestLogRepository {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self {
            db,
            tables: Mutex::new(BTreeSet::new()),
        }
    }

    fn ensure_table(&self, db: &Database, table: &str) -> Result<()> {
        let mut tables = self.tables.lock();
        if !tables.contains(table) {
            db.ensure_request_table(table)?;
            tables.insert(table.to_string());
        }
        Ok(())
    }

    /// Most recent records in `table` first.
    pub fn list_recent(&self, table: &str, limit: usize) -> Result<Vec<RequestLogRecord>> {
        let db = self.db.lock();
        self.ensure_table(&db, table)?;
        let conn = db.connection();

        let mut stmt = conn.prepare(&format!(
            "SELECT ip, method, host, uri, app, controller, action, create_time, create_date, runtime, sql_list, param
             FROM {} ORDER BY id DESC LIMIT ?",
            table
        ))?;

        let rows = stmt
            .query_map(params![limit as i64], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn count(&self, table: &str) -> Result<i64> {
        let db = self.db.lock();
        self.ensure_table(&db, table)?;
        let count = db
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<RequestLogRecord> {
    let sql_list: String = row.get(10)?;
    let param: String = row.get(11)?;

    Ok(RequestLogRecord {
        ip: row.get(0)?,
        method: row.get(1)?,
        host: row.get(2)?,
        uri: row.get(3)?,
        app: row.get(4)?,
        controller: row.get(5)?,
        action: row.get(6)?,
        create_time: row.get(7)?,
        create_date: row.get(8)?,
        runtime: row.get(9)?,
        sql_list: serde_json::from_str(&sql_list).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?,
        param: serde_json::from_str(&param).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

impl RequestLogRepository for SqliteRequestLogRepository {
    fn insert(&self, table: &str, record: &RequestLogRecord) -> RepoResult<()> {
        let sql_list = serde_json::to_string(&record.sql_list)?;
        let param = serde_json::to_string(&record.param)?;

        let db = self.db.lock();
        self.ensure_table(&db, table)?;
        db.connection()
            .execute(
                &format!(
                    "INSERT INTO {} (ip, method, host, uri, app, controller, action, create_time, create_date, runtime, sql_list, param)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    table
                ),
                params![
                    record.ip,
                    record.method,
                    record.host,
                    record.uri,
                    record.app,
                    record.controller,
                    record.action,
                    record.create_time,
                    record.create_date,
                    record.runtime,
                    sql_list,
                    param,
                ],
            )
            .with_context(|| format!("Failed to insert request log into {}", table))?;

        Ok(())
    }
}
