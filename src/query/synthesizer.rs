//! Natural-language question to sanitized SQL.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::llm::{build_messages, LlmClient};
use crate::query::sanitize::sanitize_sql;
use crate::safety::classify_sql;

/// Generates read-only SQL for a question via an LLM.
#[derive(Clone)]
pub struct QuerySynthesizer {
    client: Arc<dyn LlmClient>,
}

impl QuerySynthesizer {
    /// Creates a synthesizer backed by `client`.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Produces sanitized SQL for `question`.
    ///
    /// Fails with an LLM error if the completion call fails and with a
    /// rejection if the output does not pass the read-only gate.
    pub async fn synthesize(&self, question: &str) -> Result<String> {
        let messages = build_messages(question);
        let raw = self.client.complete(&messages).await?;
        debug!(raw = %raw, "received completion");

        let sql = sanitize_sql(&raw).inspect_err(|e| {
            warn!(raw = %raw, "generated SQL rejected: {}", e);
        })?;

        // Advisory only: the gate above is the sole accept/reject decision.
        let classification = classify_sql(&sql);
        if !classification.level.is_read_only() {
            warn!(
                level = %classification.level,
                statement_type = %classification.statement_type,
                warning = classification.warning.as_deref().unwrap_or(""),
                sql = %sql,
                "read-only gate accepted SQL the parser does not consider read-only"
            );
        }

        Ok(sql)
    }
}

impl std::fmt::Debug for QuerySynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySynthesizer").finish_non_exhaustive()
    }
}
