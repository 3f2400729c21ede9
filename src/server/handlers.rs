//! Route handlers.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiError;
use super::AppState;
use crate::db::Row;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Answers a natural-language question with generated SQL and its result.
pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload?;
    info!(question = %request.question, "received question");

    let answer = state.pipeline.ask(&request.question).await?;
    let columns = answer.result.column_names();

    Ok(Json(QueryResponse {
        sql: answer.sql,
        columns,
        rows: answer.result.rows,
    }))
}
