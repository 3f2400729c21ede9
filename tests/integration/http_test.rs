//! End-to-end HTTP tests.
//!
//! Drives the router with `oneshot`, using mock LLM and database clients.

use std::sync::Arc;

use askql::db::{ColumnInfo, DatabaseClient, FailingDatabaseClient, MockDatabaseClient, Value};
use askql::llm::MockLlmClient;
use askql::query::{QueryExecutor, QueryPipeline, QuerySynthesizer};
use askql::server::{build_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};
use tower::ServiceExt;

fn app(llm: Option<MockLlmClient>, db: Option<Arc<dyn DatabaseClient>>) -> Router {
    let pipeline = QueryPipeline::new(
        llm.map(|client| QuerySynthesizer::new(Arc::new(client))),
        db.map(QueryExecutor::new),
    );
    build_router(AppState::new(pipeline, vec!["*".to_string()]))
}

fn vendor_db() -> Arc<MockDatabaseClient> {
    Arc::new(MockDatabaseClient::with_result(
        vec![
            ColumnInfo::new("id", "TEXT"),
            ColumnInfo::new("name", "TEXT"),
            ColumnInfo::new("email", "TEXT"),
        ],
        vec![
            vec![Value::from("v1"), Value::from("Acme Supplies"), Value::Null],
            vec![
                Value::from("v2"),
                Value::from("Globex"),
                Value::from("billing@globex.test"),
            ],
        ],
    ))
}

fn ask(question: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "question": question }).to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Json) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(None, None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_list_vendors() {
    let db = vendor_db();
    let router = app(Some(MockLlmClient::new()), Some(db.clone()));

    let (status, body) = send(router, ask("list vendors")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "sql": "SELECT * FROM \"Vendor\" LIMIT 100",
            "columns": ["id", "name", "email"],
            "rows": [
                ["v1", "Acme Supplies", null],
                ["v2", "Globex", "billing@globex.test"]
            ]
        })
    );
    assert_eq!(db.executed(), vec!["SELECT * FROM \"Vendor\" LIMIT 100"]);
}

#[tokio::test]
async fn test_drop_rejected_without_execution() {
    let db = vendor_db();
    let router = app(Some(MockLlmClient::new()), Some(db.clone()));

    let (status, body) = send(router, ask("drop the invoice table")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "Only SELECT queries are allowed" }));
    assert!(db.executed().is_empty());
}

#[tokio::test]
async fn test_prose_answer_rejected() {
    let router = app(Some(MockLlmClient::new()), Some(vendor_db()));

    let (status, body) = send(router, ask("what is the meaning of life")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Only SELECT queries are allowed");
}

#[tokio::test]
async fn test_missing_database() {
    let router = app(Some(MockLlmClient::new()), None);

    let (status, body) = send(router, ask("list vendors")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "DATABASE_URL not configured" }));
}

#[tokio::test]
async fn test_missing_database_reported_before_llm() {
    let (status, body) = send(app(None, None), ask("list vendors")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "DATABASE_URL not configured");
}

#[tokio::test]
async fn test_missing_llm() {
    let (status, body) = send(app(None, Some(vendor_db())), ask("list vendors")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "LLM API key not configured");
}

#[tokio::test]
async fn test_llm_failure_wrapped() {
    let router = app(
        Some(MockLlmClient::failing("Request timed out")),
        Some(vendor_db()),
    );

    let (status, body) = send(router, ask("list vendors")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Error generating SQL: Request timed out");
}

#[tokio::test]
async fn test_database_error_passed_through() {
    let db: Arc<dyn DatabaseClient> = Arc::new(FailingDatabaseClient::new(
        "relation \"Vendor\" does not exist",
    ));
    let router = app(Some(MockLlmClient::new()), Some(db));

    let (status, body) = send(router, ask("list vendors")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "relation \"Vendor\" does not exist");
}

#[tokio::test]
async fn test_multiple_statements_truncated() {
    let llm = MockLlmClient::new().with_response(
        "paid",
        "SELECT \"amount\" FROM \"Payment\" LIMIT 5; DELETE FROM \"Payment\";",
    );
    let db = vendor_db();
    let router = app(Some(llm), Some(db.clone()));

    let (status, body) = send(router, ask("paid amounts")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sql"], "SELECT \"amount\" FROM \"Payment\" LIMIT 5");
    assert_eq!(db.executed(), vec!["SELECT \"amount\" FROM \"Payment\" LIMIT 5"]);
}

#[tokio::test]
async fn test_group_by_not_capped() {
    let router = app(Some(MockLlmClient::new()), Some(vendor_db()));

    let (status, body) = send(router, ask("total spend per category")).await;

    assert_eq!(status, StatusCode::OK);
    let sql = body["sql"].as_str().unwrap();
    assert!(sql.contains("GROUP BY"));
    assert!(!sql.contains("LIMIT"));
}

#[tokio::test]
async fn test_missing_question_field() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"q": "list vendors"}"#))
        .unwrap();

    let (status, body) = send(app(Some(MockLlmClient::new()), Some(vendor_db())), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("question"));
}

#[tokio::test]
async fn test_invalid_json_body() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app(Some(MockLlmClient::new()), Some(vendor_db())), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_missing_content_type() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/query")
        .body(Body::from(r#"{"question": "list vendors"}"#))
        .unwrap();

    let (status, body) = send(app(Some(MockLlmClient::new()), Some(vendor_db())), request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/query")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app(None, None).oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_restricted_origin_list() {
    let router = build_router(AppState::new(
        QueryPipeline::default(),
        vec!["https://app.example.com".to_string()],
    ));
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/query")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "content-type"
    );

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
