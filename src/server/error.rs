//! Mapping of service errors onto HTTP responses.
//!
//! Every failure body has the shape `{"detail": "<message>"}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::error::AskqlError;

/// Error returned from HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] AskqlError),
    /// Request body could not be decoded.
    #[error(transparent)]
    Body(#[from] JsonRejection),
}

impl ApiError {
    /// Status code and detail message sent to the client.
    pub fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            ApiError::Service(err) => match err {
                AskqlError::Rejected(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                AskqlError::Llm(msg) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error generating SQL: {msg}"),
                ),
                AskqlError::Config(msg)
                | AskqlError::Connection(msg)
                | AskqlError::Query(msg)
                | AskqlError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            },
            ApiError::Body(rejection) => (rejection.status(), rejection.body_text()),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            ApiError::Service(err) => err.category(),
            ApiError::Body(_) => "Invalid Body",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        if status.is_server_error() {
            error!(category = self.category(), %detail, "request failed");
        }
        (status, Json(ErrorPayload { detail })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    detail: String,
}
