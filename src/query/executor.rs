//! Execution of sanitized SQL against the configured database.

use std::sync::Arc;

use tracing::{info, warn};

use crate::db::{DatabaseClient, QueryResult};
use crate::error::Result;

/// Runs SQL through a [`DatabaseClient`] and logs the outcome.
#[derive(Clone)]
pub struct QueryExecutor {
    db: Arc<dyn DatabaseClient>,
}

impl QueryExecutor {
    /// Creates a new query executor.
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    /// Executes `sql` and returns its columns and rows.
    ///
    /// Database errors are passed through unchanged.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        match self.db.execute_query(sql).await {
            Ok(result) => {
                info!(
                    rows = result.row_count,
                    truncated = result.was_truncated,
                    elapsed_ms = result.execution_time.as_millis() as u64,
                    "query executed"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(sql = %sql, "query failed: {}", e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor").finish_non_exhaustive()
    }
}
