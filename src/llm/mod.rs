//! LLM integration for askql.
//!
//! Provides the client trait used by the query synthesizer and its
//! implementations: an OpenAI-compatible chat-completions client (Groq,
//! OpenAI) and a deterministic mock.

pub mod factory;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod types;

pub use factory::create_client;
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::strip_code_fences;
pub use prompt::{build_messages, build_user_prompt, SCHEMA_INFO};
pub use types::{Message, Role};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync); one client is shared
/// by every request handler.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Returns the complete response as a single string.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Groq's OpenAI-compatible endpoint.
    #[default]
    Groq,
    /// OpenAI.
    OpenAi,
    /// Mock client for local runs and tests (no API key required).
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }

    /// Returns the chat-completions endpoint used when none is configured.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("https://api.groq.com/openai/v1/chat/completions"),
            Self::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            Self::Mock => None,
        }
    }

    /// Returns true if the provider needs an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Mock)
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("groq".parse::<LlmProvider>().unwrap(), LlmProvider::Groq);
        assert_eq!("Groq".parse::<LlmProvider>().unwrap(), LlmProvider::Groq);
        assert_eq!(
            "OpenAI".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAi
        );
        assert_eq!("mock".parse::<LlmProvider>().unwrap(), LlmProvider::Mock);
        assert!("anthropic".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(format!("{}", LlmProvider::Groq), "groq");
        assert_eq!(LlmProvider::default(), LlmProvider::Groq);
    }

    #[test]
    fn test_provider_base_urls() {
        assert!(LlmProvider::Groq
            .default_base_url()
            .unwrap()
            .contains("api.groq.com"));
        assert!(LlmProvider::OpenAi
            .default_base_url()
            .unwrap()
            .contains("api.openai.com"));
        assert_eq!(LlmProvider::Mock.default_base_url(), None);
        assert!(!LlmProvider::Mock.requires_api_key());
    }

    #[tokio::test]
    async fn test_mock_client_implements_trait() {
        let client: Box<dyn LlmClient> = Box::new(MockLlmClient::new());
        let messages = build_messages("list vendors");
        let response = client.complete(&messages).await.unwrap();
        assert!(response.contains("SELECT"));
    }
}
