//! Document analysis route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::server::AppState;
use crate::intelligence::AnalyzeRequest;

/// POST /api/analyze
pub async fn analyze_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    if request.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Document text is empty"})),
        )
            .into_response();
    }
    let Some(ref intelligence) = state.intelligence else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "LLM provider not configured"})),
        )
            .into_response();
    };

    let report = intelligence.analyze(&request).await;
    (StatusCode::OK, Json(report)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ContentCache;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_analyze_rejects_blank_text() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(ContentCache::new(tmp.path()));
        let state = Arc::new(AppState::new(cache));

        let resp = analyze_document(State(state), Json(AnalyzeRequest::new("  \n\t"))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
