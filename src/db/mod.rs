//! Database abstraction layer for askql.
//!
//! Provides a trait-based interface for executing generated SQL, so the HTTP
//! layer can be exercised against mock backends.

mod mock;
mod postgres;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with AskqlError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query and returns at most the configured number of rows.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;
}
