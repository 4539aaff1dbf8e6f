//! `docai serve` command handler.

use anyhow::{Context, Result};
use tracing::{info, warn};

use docai::api::server::{start_server, AppState};
use docai::config::Config;

use super::common::{build_cache, try_build_intelligence};

/// Start the HTTP API with the configured cache and provider.
pub(crate) async fn cmd_serve(
    mut config: Config,
    bind: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let cache = build_cache(&config);
    let mut state = AppState::new(cache.clone());
    match try_build_intelligence(&config, cache.clone())? {
        Some(intelligence) => {
            info!(
                provider = intelligence.provider().name(),
                model = intelligence.provider().default_model(),
                "LLM provider ready"
            );
            state = state.with_intelligence(intelligence);
        }
        None => warn!("No Gemini API key configured; warm and analyze endpoints are disabled"),
    }
    info!(dir = %cache.dir().display(), "Using cache directory");

    let result = start_server(&config.server, state)
        .await
        .with_context(|| format!("API server on {} failed", config.server.addr()));
    cache.metrics().emit("shutdown");
    result
}
