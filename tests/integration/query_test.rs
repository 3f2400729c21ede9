//! Query execution integration tests.
//!
//! These run the full pipeline against a real PostgreSQL database and are
//! skipped unless DATABASE_URL is set.

use std::sync::Arc;

use askql::config::normalize_database_url;
use askql::db::{DatabaseClient, PostgresClient, Value};
use askql::error::AskqlError;
use askql::llm::MockLlmClient;
use askql::query::{QueryExecutor, QueryPipeline, QuerySynthesizer};

/// Helper to create a test client.
fn get_test_client(max_rows: usize) -> Option<Arc<dyn DatabaseClient>> {
    let url = std::env::var("DATABASE_URL")
        .ok()
        .and_then(|raw| normalize_database_url(&raw))?;
    Some(Arc::new(PostgresClient::new(url, max_rows)))
}

fn pipeline(llm: MockLlmClient, db: Arc<dyn DatabaseClient>) -> QueryPipeline {
    QueryPipeline::new(
        Some(QuerySynthesizer::new(Arc::new(llm))),
        Some(QueryExecutor::new(db)),
    )
}

#[tokio::test]
async fn test_generated_cte_executes() {
    let Some(db) = get_test_client(100) else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let llm = MockLlmClient::new().with_response(
        "numbers",
        "```sql\nWITH nums AS (SELECT generate_series(1, 3) AS n) SELECT n, n * 2 AS doubled FROM nums ORDER BY n\n```",
    );
    let answer = pipeline(llm, db).ask("numbers please").await.unwrap();

    assert!(answer.sql.ends_with("LIMIT 100"));
    assert_eq!(answer.result.column_names(), vec!["n", "doubled"]);
    assert_eq!(answer.result.rows.len(), 3);
    assert_eq!(answer.result.rows[2], vec![Value::Int(3), Value::Int(6)]);
}

#[tokio::test]
async fn test_injected_limit_caps_rows() {
    let Some(db) = get_test_client(10_000) else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let llm = MockLlmClient::new().with_response("series", "SELECT generate_series(1, 500) AS n");
    let answer = pipeline(llm, db).ask("big series").await.unwrap();

    assert_eq!(answer.result.row_count, 100);
    assert!(!answer.result.was_truncated);
}

#[tokio::test]
async fn test_fetch_cap_applies_when_limit_present() {
    let Some(db) = get_test_client(5) else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let llm = MockLlmClient::new()
        .with_response("series", "SELECT generate_series(1, 50) AS n LIMIT 50");
    let answer = pipeline(llm, db).ask("series").await.unwrap();

    assert_eq!(answer.result.row_count, 5);
    assert!(answer.result.was_truncated);
}

#[tokio::test]
async fn test_database_error_message_surfaces() {
    let Some(db) = get_test_client(10) else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let llm = MockLlmClient::new()
        .with_response("missing", "SELECT * FROM \"NoSuchTable_askql\"");
    let err = pipeline(llm, db).ask("missing table").await.unwrap_err();

    assert!(matches!(err, AskqlError::Query(_)));
    assert!(err.message().contains("NoSuchTable_askql"));
}
