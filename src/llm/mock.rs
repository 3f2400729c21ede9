//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on the question embedded in the
//! prompt.

use async_trait::async_trait;

use crate::error::{AskqlError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for tests and for running the service without an API key.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// When set, every call fails with this message.
    failure: Option<String>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock client whose calls always fail.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Generates a mock response based on the question.
    fn mock_response(&self, question: &str) -> String {
        let question = question.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if question.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if question.contains("delete") || question.contains("drop") {
            return "DROP TABLE \"Invoice\";".to_string();
        }

        if question.contains("overdue") {
            return "```sql\nSELECT \"invoiceNumber\", \"total\" FROM \"Invoice\" WHERE \"status\" = 'OVERDUE'\n```"
                .to_string();
        }

        if question.contains("spend") && question.contains("categor") {
            return "```sql\nSELECT c.\"name\", SUM(i.\"total\") AS spend\nFROM \"Invoice\" i\nJOIN \"Category\" c ON c.\"id\" = i.\"categoryId\"\nGROUP BY c.\"name\"\nORDER BY spend DESC;\n```"
                .to_string();
        }

        if question.contains("count") && question.contains("invoice") {
            return "```sql\nSELECT COUNT(*) FROM \"Invoice\";\n```".to_string();
        }

        if question.contains("vendor") {
            return "```sql\nSELECT * FROM \"Vendor\"\n```".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }

    /// Extracts the question from the last user message.
    ///
    /// The synthesis prompt carries the question on a `Question:` line; bare
    /// messages are used whole.
    fn extract_question(messages: &[Message]) -> String {
        let content = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        content
            .lines()
            .find_map(|line| line.strip_prefix("Question: "))
            .unwrap_or(content)
            .to_string()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        if let Some(message) = &self.failure {
            return Err(AskqlError::llm(message.clone()));
        }
        let question = Self::extract_question(messages);
        Ok(self.mock_response(&question))
    }
}
