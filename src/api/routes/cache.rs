//! Cache administration routes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::server::AppState;
use crate::cache::{CacheCounters, CacheStats};

#[derive(Debug, Default, Deserialize)]
pub struct ClearParams {
    /// Only clear entries written by this operation.
    pub operation: Option<String>,
}

fn stats_json(stats: &CacheStats) -> Value {
    json!({
        "total_entries": stats.total_entries,
        "total_size_kb": stats.total_size_kb(),
        "by_operation": stats.by_operation,
    })
}

fn counters_json(counters: &CacheCounters) -> Value {
    json!({
        "hits": counters.hits,
        "misses": counters.misses,
        "corrupt": counters.corrupt,
        "writes": counters.writes,
        "write_errors": counters.write_errors,
        "hit_ratio": (counters.hit_ratio() * 1000.0).round() / 1000.0,
    })
}

/// GET /api/cache/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.cache.stats();
    Json(json!({
        "status": "ok",
        "cache_stats": stats_json(&stats),
        "counters": counters_json(&state.cache.counters()),
        "message": format!("Cache contains {} entries", stats.total_entries),
    }))
}

/// DELETE /api/cache/clear[?operation=op]
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClearParams>,
) -> Json<Value> {
    let operation = params.operation.as_deref().filter(|op| !op.is_empty());
    let deleted = state.cache.clear(operation);

    let message = match operation {
        Some(op) => format!("Cleared cache for operation: {op}"),
        None => "Cleared cache".to_string(),
    };
    info!(operation = operation.unwrap_or("*"), deleted, "Cache cleared via API");

    Json(json!({
        "status": "ok",
        "message": message,
        "deleted": deleted,
        "new_stats": stats_json(&state.cache.stats()),
    }))
}

/// POST /api/cache/warm
pub async fn warm_cache(State(state): State<Arc<AppState>>) -> Response {
    let Some(ref intelligence) = state.intelligence else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "LLM provider not configured"})),
        )
            .into_response();
    };

    let warmed = intelligence.warm().await;
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "message": "Cache warmed with sample documents",
            "warmed": warmed,
            "new_stats": stats_json(&state.cache.stats()),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ContentCache;
    use crate::intelligence::DocumentIntelligence;
    use crate::providers::MockLLMProvider;
    use tempfile::TempDir;

    fn make_state() -> (Arc<AppState>, TempDir) {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(ContentCache::new(tmp.path().join("cache")));
        (Arc::new(AppState::new(cache)), tmp)
    }

    #[tokio::test]
    async fn test_get_stats_empty() {
        let (state, _tmp) = make_state();
        let Json(body) = get_stats(State(state)).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache_stats"]["total_entries"], 0);
        assert_eq!(body["cache_stats"]["total_size_kb"], 0.0);
        assert_eq!(body["counters"]["hits"], 0);
        assert_eq!(body["counters"]["hit_ratio"], 0.0);
        assert_eq!(body["message"], "Cache contains 0 entries");
    }

    #[tokio::test]
    async fn test_get_stats_reports_counters() {
        let (state, _tmp) = make_state();
        state.cache.set("doc", "summarize", &json!({"summary": "s"}));
        assert!(state.cache.get("doc", "summarize").is_some());
        assert!(state.cache.get("other", "summarize").is_none());

        let Json(body) = get_stats(State(state)).await;
        assert_eq!(body["cache_stats"]["by_operation"]["summarize"], 1);
        assert_eq!(body["counters"]["hits"], 1);
        assert_eq!(body["counters"]["misses"], 1);
        assert_eq!(body["counters"]["writes"], 1);
        assert_eq!(body["counters"]["hit_ratio"], 0.5);
    }

    #[tokio::test]
    async fn test_clear_empty_operation_clears_everything() {
        let (state, _tmp) = make_state();
        state.cache.set("a", "classify", &json!(1));
        state.cache.set("b", "embeddings", &json!({"values": []}));

        let params = ClearParams {
            operation: Some(String::new()),
        };
        let Json(body) = clear_cache(State(state), Query(params)).await;
        assert_eq!(body["deleted"], 2);
        assert_eq!(body["message"], "Cleared cache");
    }

    #[tokio::test]
    async fn test_warm_populates_classify_entries() {
        let (state, _tmp) = make_state();
        let mut mock = MockLLMProvider::new();
        mock.expect_generate()
            .times(3)
            .returning(|_, _| Ok(r#"{"document_type":"invoice","confidence":0.6}"#.to_string()));
        let intelligence = DocumentIntelligence::new(Arc::new(mock), Arc::clone(&state.cache));
        let state = Arc::new(AppState::clone(&state).with_intelligence(intelligence));

        let resp = warm_cache(State(Arc::clone(&state))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.cache.stats().by_operation["classify"], 3);
    }
}
