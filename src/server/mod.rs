//! HTTP server: router, shared state and lifecycle.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{DatabaseClient, PostgresClient};
use crate::error::AskqlError;
use crate::llm::create_client;
use crate::query::{QueryExecutor, QueryPipeline, QuerySynthesizer};

pub use error::ApiError;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to initialize: {0}")]
    Init(#[from] AskqlError),
    #[error("failed to bind listener: {0}")]
    Io(#[from] std::io::Error),
}

/// State shared by every request. Built once at startup and never mutated.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub pipeline: QueryPipeline,
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(pipeline: QueryPipeline, cors_origins: Vec<String>) -> Self {
        Self {
            pipeline,
            cors_origins,
        }
    }

    /// Builds the LLM and database clients described by `config`.
    ///
    /// Missing credentials are not fatal; the affected requests fail with a
    /// configuration error instead.
    pub fn from_config(config: &Config) -> Result<Self, AskqlError> {
        let synthesizer = create_client(&config.llm)?.map(QuerySynthesizer::new);

        let executor = match &config.database_url {
            Some(url) => {
                let db: Arc<dyn DatabaseClient> =
                    Arc::new(PostgresClient::new(url.clone(), config.query.max_rows));
                Some(QueryExecutor::new(db))
            }
            None => {
                warn!("DATABASE_URL not set. Queries will fail until it is configured.");
                None
            }
        };

        Ok(Self::new(
            QueryPipeline::new(synthesizer, executor),
            config.server.cors_origins.clone(),
        ))
    }
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.cors_origins);

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/query", post(handlers::query));

    if let Some(layer) = cors {
        router = router.layer(layer);
    }

    router
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    if origins.iter().any(|origin| origin.trim() == "*") {
        // Credentials cannot be combined with wildcards.
        return Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let mut allowed = Vec::new();
    for origin in origins {
        let trimmed = origin.trim().trim_end_matches('/');
        match HeaderValue::from_str(trimmed) {
            Ok(value) if !trimmed.is_empty() => allowed.push(value),
            _ => warn!(%origin, "ignoring invalid CORS origin"),
        }
    }

    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true),
    )
}

/// Starts the server described by `config` and runs until Ctrl-C.
pub async fn serve(config: &Config) -> Result<(), ServeError> {
    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let addr = SocketAddr::from((config.server.host, config.server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        %addr,
        database = config.redacted_database_url().as_deref().unwrap_or("<unset>"),
        provider = %config.llm.provider,
        model = %config.llm.model,
        cors_origins = ?config.server.cors_origins,
        "askql listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}
