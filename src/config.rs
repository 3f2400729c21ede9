//! Configuration management for askql.
//!
//! Handles loading configuration from an optional TOML file and layering
//! command-line/environment overrides on top. The resulting [`Config`] is
//! built once at startup and never mutated afterwards.

use crate::error::{AskqlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use url::Url;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default cap on rows materialized per query.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Default request timeout for the LLM HTTP client.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for askql.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// PostgreSQL connection string.
    #[serde(default)]
    pub database_url: Option<String>,

    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Query execution limits.
    #[serde(default)]
    pub query: QueryConfig,
}

/// LLM provider configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "groq", "openai" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for the provider. Not recommended to store in the config file.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name (e.g., "llama-3.3-70b-versatile").
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature. Kept low so output is near-deterministic.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Override for the chat-completions endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout_secs() -> u64 {
    DEFAULT_LLM_TIMEOUT_SECS
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Listening port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed cross-origin sources. `*` permits any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Query execution limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum rows fetched from the result cursor.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
        }
    }
}

/// Values supplied on the command line or through the environment.
///
/// Every field that is `Some` replaces the corresponding config-file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub llm_provider: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    pub cors_origins: Option<String>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AskqlError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AskqlError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies command-line/environment overrides, then normalizes values.
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.database_url {
            self.database_url = Some(url);
        }
        if let Some(provider) = overrides.llm_provider {
            self.llm.provider = provider;
        }
        if let Some(key) = overrides.llm_api_key {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(base_url);
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(origins) = overrides.cors_origins {
            self.server.cors_origins = parse_origins(&origins);
        }

        self.database_url = self
            .database_url
            .as_deref()
            .and_then(normalize_database_url);
        self.llm.api_key = self.llm.api_key.filter(|key| !key.trim().is_empty());
        self
    }

    /// Returns the database URL with any password masked, for logging.
    pub fn redacted_database_url(&self) -> Option<String> {
        self.database_url.as_deref().map(redact_url)
    }
}

/// Normalizes a connection string.
///
/// Empty strings count as unset. SQLAlchemy-style driver suffixes such as
/// `postgresql+psycopg://` are reduced to the plain scheme.
pub fn normalize_database_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some((scheme, rest)) = trimmed.split_once("://") {
        if let Some((base, _driver)) = scheme.split_once('+') {
            return Some(format!("{base}://{rest}"));
        }
    }

    Some(trimmed.to_string())
}

/// Splits a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable connection string>".to_string(),
    }
}
