//! Mock database clients for testing.

use super::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{AskqlError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns a predefined result and records the
/// SQL it was asked to run.
#[derive(Debug)]
pub struct MockDatabaseClient {
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock returning a single `result` column that echoes the SQL.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock that returns the given columns and rows.
    pub fn with_result(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Returns every SQL string executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.executed
            .lock()
            .map_err(|_| AskqlError::internal("mock database lock poisoned"))?
            .push(sql.to_string());

        let result = if self.columns.is_empty() {
            QueryResult::with_data(
                vec![ColumnInfo::new("result", "TEXT")],
                vec![vec![Value::String(format!("Mock result for: {}", sql))]],
            )
        } else {
            QueryResult::with_data(self.columns.clone(), self.rows.clone())
        };

        Ok(result.with_execution_time(Duration::from_millis(1)))
    }
}

/// A database client whose every query fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client that fails with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(AskqlError::query(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_echoes_sql() {
        let client = MockDatabaseClient::new();
        let result = client.execute_query("SELECT 1").await.unwrap();
        assert_eq!(result.row_count, 1);
        assert_eq!(result.column_names(), vec!["result"]);
        assert_eq!(client.executed(), vec!["SELECT 1"]);
    }

    #[tokio::test]
    async fn test_mock_with_result() {
        let client = MockDatabaseClient::with_result(
            vec![ColumnInfo::new("name", "TEXT")],
            vec![vec![Value::from("Acme")], vec![Value::from("Globex")]],
        );
        let result = client.execute_query("SELECT name FROM v").await.unwrap();
        assert_eq!(result.row_count, 2);
        assert_eq!(result.rows[1][0], Value::from("Globex"));
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = FailingDatabaseClient::new("relation \"Vendr\" does not exist");
        let err = client.execute_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, AskqlError::Query(_)));
        assert_eq!(err.message(), "relation \"Vendr\" does not exist");
    }
}
