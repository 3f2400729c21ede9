//! Integration tests for askql.

pub mod config_test;
pub mod http_test;
pub mod query_test;
