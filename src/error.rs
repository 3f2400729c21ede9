//! Error types for askql.
//!
//! Defines the main error enum used throughout the service.

use thiserror::Error;

/// Main error type for askql operations.
#[derive(Error, Debug)]
pub enum AskqlError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, permission denied, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (rate limits, auth, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (missing credential, missing connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generated SQL refused by the read-only gate.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AskqlError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a rejection error with the given message.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Rejected(_) => "Rejected",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the bare message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Llm(msg)
            | Self::Config(msg)
            | Self::Rejected(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias using AskqlError.
pub type Result<T> = std::result::Result<T, AskqlError>;
