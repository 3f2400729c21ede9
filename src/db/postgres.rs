//! PostgreSQL database client implementation.
//!
//! Every call opens a fresh connection, runs one statement and closes the
//! connection again. There is no pool and no retry.

use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{AskqlError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::TryStreamExt;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney};
use sqlx::postgres::{PgConnection, PgHasArrayType, PgRow, PgTypeInfo, PgTypeKind, Postgres};
use sqlx::{Column as SqlxColumn, Connection, Executor, Row as SqlxRow, Statement, TypeInfo};
use std::time::Instant;
use tracing::{debug, warn};

/// PostgreSQL database client.
#[derive(Debug, Clone)]
pub struct PostgresClient {
    database_url: String,
    max_rows: usize,
}

impl PostgresClient {
    /// Creates a client for the given connection string.
    ///
    /// No connection is made until a query runs.
    pub fn new(database_url: impl Into<String>, max_rows: usize) -> Self {
        Self {
            database_url: database_url.into(),
            max_rows,
        }
    }

    /// Returns the row cap applied to every query.
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Prepares the statement, reads its column descriptor and fetches rows
    /// until the cap is reached.
    async fn fetch_capped(
        &self,
        conn: &mut PgConnection,
        sql: &str,
    ) -> Result<(Vec<ColumnInfo>, Vec<Row>, bool)> {
        let statement = Executor::prepare(&mut *conn, sql)
            .await
            .map_err(|e| AskqlError::query(format_query_error(&e)))?;

        let columns: Vec<ColumnInfo> = statement
            .columns()
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect();

        let mut rows: Vec<Row> = Vec::new();
        let mut was_truncated = false;
        let mut stream = statement.query().fetch(&mut *conn);

        while let Some(row) = stream
            .try_next()
            .await
            .map_err(|e| AskqlError::query(format_query_error(&e)))?
        {
            if rows.len() >= self.max_rows {
                was_truncated = true;
                break;
            }
            rows.push(convert_row(&row));
        }

        Ok((columns, rows, was_truncated))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let mut conn = PgConnection::connect(&self.database_url)
            .await
            .map_err(|e| AskqlError::connection(format_query_error(&e)))?;
        debug!("Opened database connection");

        let outcome = self.fetch_capped(&mut conn, sql).await;

        // Close on every path; a failed close never masks the query outcome.
        if let Err(e) = conn.close().await {
            warn!("Failed to close database connection: {}", e);
        }

        let (columns, rows, was_truncated) = outcome?;
        let execution_time = start.elapsed();

        if was_truncated {
            warn!("Query result truncated to {} rows", self.max_rows);
        }

        let row_count = rows.len();
        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
            was_truncated,
        })
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
///
/// Rows arrive in binary format, so every arm decodes through a type sqlx
/// checks against the column. Anything that fails to decode becomes NULL.
fn convert_value(row: &PgRow, index: usize, type_info: &PgTypeInfo) -> Value {
    // Enum labels are sent as their text, whatever the type is named.
    if let PgTypeKind::Enum(_) = type_info.kind() {
        return row
            .try_get_unchecked::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null);
    }

    match type_info.name().to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "OID" => row
            .try_get::<Option<Oid>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v.0 as i64))
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(index)
            .ok()
            .flatten()
            .and_then(|v| v.to_f64())
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "MONEY" => row
            .try_get::<Option<PgMoney>, _>(index)
            .ok()
            .flatten()
            .and_then(|v| v.to_decimal(MONEY_FRACTION_DIGITS).to_f64())
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),

        "INTERVAL" => row
            .try_get::<Option<PgInterval>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(interval_seconds(&v)))
            .unwrap_or(Value::Null),

        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .ok()
            .flatten()
            .map(Value::Json)
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        "UUID" => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .and_then(|bytes| format_uuid(&bytes))
            .map(Value::String)
            .unwrap_or(Value::Null),

        "BOOL[]" => array_value::<bool>(row, index),
        "INT2[]" => array_value::<i16>(row, index),
        "INT4[]" => array_value::<i32>(row, index),
        "INT8[]" => array_value::<i64>(row, index),
        "FLOAT4[]" => array_value::<f32>(row, index),
        "FLOAT8[]" => array_value::<f64>(row, index),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => array_value::<String>(row, index),

        "NUMERIC[]" => row
            .try_get::<Option<Vec<Option<Decimal>>>, _>(index)
            .ok()
            .flatten()
            .map(|items| {
                Value::Json(serde_json::Value::Array(
                    items
                        .into_iter()
                        .map(|item| item.and_then(|d| d.to_f64()).into())
                        .collect(),
                ))
            })
            .unwrap_or(Value::Null),

        // Text-like types (TEXT, VARCHAR, BPCHAR, NAME, CITEXT, ...).
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Digits after the decimal point for MONEY, as in the default `C` locale.
const MONEY_FRACTION_DIGITS: u32 = 2;

/// Decodes a one-dimensional array into a JSON array; NULL elements stay null.
fn array_value<T>(row: &PgRow, index: usize) -> Value
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + PgHasArrayType + Into<serde_json::Value>,
{
    row.try_get::<Option<Vec<Option<T>>>, _>(index)
        .ok()
        .flatten()
        .map(|items| {
            Value::Json(serde_json::Value::Array(
                items.into_iter().map(serde_json::Value::from).collect(),
            ))
        })
        .unwrap_or(Value::Null)
}

/// Total length of an interval in seconds. A month counts as 30 days.
fn interval_seconds(interval: &PgInterval) -> f64 {
    const SECONDS_PER_DAY: f64 = 86_400.0;
    let days = interval.months as f64 * 30.0 + interval.days as f64;
    days * SECONDS_PER_DAY + interval.microseconds as f64 / 1_000_000.0
}

/// Formats 16 raw bytes as a hyphenated UUID.
fn format_uuid(bytes: &[u8]) -> Option<String> {
    if bytes.len() != 16 {
        return None;
    }
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    Some(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}

/// Formats a database error: the server message, plus detail and hint when
/// PostgreSQL supplies them.
fn format_query_error(error: &sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = db_error.message().to_string();

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\nDETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\nHINT: ");
            result.push_str(hint);
        }
    }

    result
}
