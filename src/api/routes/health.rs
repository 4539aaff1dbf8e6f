//! Liveness endpoints.

use axum::Json;
use serde_json::{json, Value};

/// GET / returns the service banner.
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "docai",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// GET /health
pub async fn get_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_health_returns_ok() {
        let Json(body) = get_health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_root_reports_version() {
        let Json(body) = root().await;
        assert_eq!(body["service"], "docai");
        assert!(body["version"].is_string());
    }
}
