//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::error::{AskqlError, Result};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Creates the LLM client described by `config`.
///
/// Returns `Ok(None)` when the provider needs an API key and none is
/// configured: the service still starts, and synthesis requests fail with a
/// configuration error.
pub fn create_client(config: &LlmConfig) -> Result<Option<Arc<dyn LlmClient>>> {
    let provider: LlmProvider = config.provider.parse().map_err(AskqlError::config)?;

    if !provider.requires_api_key() {
        info!(%provider, "using mock LLM client");
        return Ok(Some(Arc::new(MockLlmClient::new())));
    }

    let Some(key) = config.api_key.clone() else {
        warn!(%provider, "LLM API key not set. Query synthesis will not work.");
        return Ok(None);
    };

    let mut client_config = OpenAiConfig::new(provider, key, config.model.clone())
        .with_temperature(config.temperature)
        .with_timeout(config.timeout_secs);
    if let Some(base_url) = &config.base_url {
        client_config = client_config.with_base_url(base_url.clone());
    }

    let client = OpenAiClient::new(client_config)?;
    info!(%provider, model = client.model(), "LLM client ready");
    Ok(Some(Arc::new(client)))
}
