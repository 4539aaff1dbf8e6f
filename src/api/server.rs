//! Axum API server for cache administration and document analysis.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::config::ServerConfig;
use crate::api::routes;
use crate::cache::ContentCache;
use crate::error::Result;
use crate::intelligence::DocumentIntelligence;

/// Shared state for all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ContentCache>,
    /// Present when an LLM provider is configured. Warm and analyze return
    /// 503 without it; stats and clear keep working.
    pub intelligence: Option<DocumentIntelligence>,
}

impl AppState {
    pub fn new(cache: Arc<ContentCache>) -> Self {
        Self {
            cache,
            intelligence: None,
        }
    }

    pub fn with_intelligence(mut self, intelligence: DocumentIntelligence) -> Self {
        self.intelligence = Some(intelligence);
        self
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::get_health))
        // Cache administration
        .route("/api/cache/stats", get(routes::cache::get_stats))
        .route("/api/cache/clear", delete(routes::cache::clear_cache))
        .route("/api/cache/warm", post(routes::cache::warm_cache))
        // Analysis
        .route("/api/analyze", post(routes::analyze::analyze_document))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

/// Start the API server and run until Ctrl-C.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = build_router(state, config.max_body_bytes);
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "DocAI API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("DocAI API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
