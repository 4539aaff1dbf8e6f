//! Shared helpers for CLI command handlers.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use docai::cache::ContentCache;
use docai::config::Config;
use docai::intelligence::DocumentIntelligence;
use docai::providers::GeminiProvider;

/// Open the content cache configured in `config`.
pub(crate) fn build_cache(config: &Config) -> Arc<ContentCache> {
    Arc::new(ContentCache::from_config(&config.cache))
}

/// Build the intelligence layer if a provider key is available.
pub(crate) fn try_build_intelligence(
    config: &Config,
    cache: Arc<ContentCache>,
) -> Result<Option<DocumentIntelligence>> {
    let provider = GeminiProvider::from_config(&config.gemini)
        .with_context(|| "Failed to initialize Gemini provider")?;
    Ok(provider.map(|p| DocumentIntelligence::new(Arc::new(p), cache)))
}

/// Build the intelligence layer, failing when no provider key is configured.
pub(crate) fn build_intelligence(
    config: &Config,
    cache: Arc<ContentCache>,
) -> Result<DocumentIntelligence> {
    try_build_intelligence(config, cache)?.ok_or_else(|| {
        anyhow::anyhow!(
            "No Gemini API key configured. Set GEMINI_API_KEY or gemini.api_key in {}",
            Config::path().display()
        )
    })
}

/// Read document text from `path`, or from stdin when `path` is `-`.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    read_input_from(path, std::io::stdin().lock())
}

pub(crate) fn read_input_from<R: Read>(path: &Path, mut stdin: R) -> Result<String> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        stdin
            .read_to_string(&mut buf)
            .with_context(|| "Failed to read document from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document {}", path.display()))?
    };
    if text.trim().is_empty() {
        anyhow::bail!("Document is empty");
    }
    Ok(text)
}
