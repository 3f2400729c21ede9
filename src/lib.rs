//! askql - ask questions in plain language, get read-only SQL results back.
//!
//! This library exposes the core modules for the binary and for integration
//! tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod query;
pub mod safety;
pub mod server;
