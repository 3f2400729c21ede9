//! Question answering: SQL synthesis followed by execution.
//!
//! [`QueryPipeline`] chains the two steps. Either side may be unconfigured;
//! the service still starts and requests fail with a configuration error.

pub mod executor;
pub mod sanitize;
pub mod synthesizer;

pub use executor::QueryExecutor;
pub use sanitize::{apply_row_cap, sanitize_sql, truncate_at_semicolon, DEFAULT_LIMIT};
pub use synthesizer::QuerySynthesizer;

use tracing::info;

use crate::db::QueryResult;
use crate::error::{AskqlError, Result};

/// Message returned when no database connection string is configured.
pub const DATABASE_NOT_CONFIGURED: &str = "DATABASE_URL not configured";

/// Message returned when no LLM credential is configured.
pub const LLM_NOT_CONFIGURED: &str = "LLM API key not configured";

/// The SQL that was run and what it returned.
#[derive(Debug, Clone)]
pub struct Answer {
    pub sql: String,
    pub result: QueryResult,
}

/// Synthesis and execution chained for one question.
#[derive(Debug, Clone, Default)]
pub struct QueryPipeline {
    synthesizer: Option<QuerySynthesizer>,
    executor: Option<QueryExecutor>,
}

impl QueryPipeline {
    pub fn new(synthesizer: Option<QuerySynthesizer>, executor: Option<QueryExecutor>) -> Self {
        Self {
            synthesizer,
            executor,
        }
    }

    /// Returns true if both the LLM and the database are configured.
    pub fn is_ready(&self) -> bool {
        self.synthesizer.is_some() && self.executor.is_some()
    }

    /// Answers `question`.
    ///
    /// The database configuration is checked before any LLM call, so a
    /// missing connection string never costs a completion request.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let executor = self
            .executor
            .as_ref()
            .ok_or_else(|| AskqlError::config(DATABASE_NOT_CONFIGURED))?;
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or_else(|| AskqlError::config(LLM_NOT_CONFIGURED))?;

        let sql = synthesizer.synthesize(question).await?;
        info!(sql = %sql, "generated SQL");

        let result = executor.execute(&sql).await?;
        Ok(Answer { sql, result })
    }
}
