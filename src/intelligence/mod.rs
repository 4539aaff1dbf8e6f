//! Cached document operations on top of an [`LLMProvider`].
//!
//! Every operation follows the cache-aside pattern through
//! [`ContentCache::get_or_compute`]: a hit returns the stored result without
//! touching the provider, a miss calls the provider and stores the result
//! only when the call succeeds.

pub mod pipeline;
pub mod prompts;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::cache::{composite_text, ContentCache, Operation};
use crate::error::{DocaiError, Result};
use crate::providers::{GenerateOptions, LLMProvider};

pub use pipeline::{AnalysisReport, AnalyzeRequest, WarmedSample, WARM_SAMPLES};

/// Result of document classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default = "unknown_type")]
    pub document_type: String,
    #[serde(default)]
    pub confidence: f64,
}

fn unknown_type() -> String {
    "unknown".to_string()
}

impl Classification {
    /// Fallback used when classification is unavailable.
    pub fn unknown() -> Self {
        Self {
            document_type: unknown_type(),
            confidence: 0.0,
        }
    }
}

/// Cached classify / extract / summarize / embed operations.
///
/// Clone is cheap; the provider and cache are shared.
#[derive(Clone)]
pub struct DocumentIntelligence {
    provider: Arc<dyn LLMProvider>,
    cache: Arc<ContentCache>,
}

impl DocumentIntelligence {
    pub fn new(provider: Arc<dyn LLMProvider>, cache: Arc<ContentCache>) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Classify `text` into one of [`prompts::DOCUMENT_TYPES`].
    ///
    /// Only payloads that parse as a [`Classification`] are cached. A cached
    /// entry of any other shape is recomputed and overwritten.
    pub async fn classify(&self, text: &str) -> Result<Classification> {
        let provider = &self.provider;
        let value = self
            .cache
            .get_or_compute(text, Operation::Classify.as_str(), move || async move {
                let classification = request_classification(provider.as_ref(), text).await?;
                Ok::<_, DocaiError>(serde_json::to_value(&classification)?)
            })
            .await?;

        match serde_json::from_value(value) {
            Ok(classification) => Ok(classification),
            Err(e) => {
                warn!(error = %e, "Cached classification has an unexpected shape, recomputing");
                let classification = request_classification(self.provider.as_ref(), text).await?;
                self.cache.set(
                    text,
                    Operation::Classify.as_str(),
                    &serde_json::to_value(&classification)?,
                );
                Ok(classification)
            }
        }
    }

    /// Extract structured fields from `text` as a `doc_type` document.
    ///
    /// Cached under the composite input `"{doc_type}|{text}"`.
    pub async fn extract(&self, text: &str, doc_type: &str) -> Result<Value> {
        let key_text = composite_text(doc_type, text);
        let provider = &self.provider;
        self.cache
            .get_or_compute(&key_text, Operation::Extract.as_str(), move || async move {
                let raw = provider
                    .generate(
                        &prompts::extract_prompt(text, doc_type),
                        GenerateOptions::json(),
                    )
                    .await?;
                prompts::parse_json_response(&raw)
            })
            .await
    }

    /// Summarize `text`. Cached as `{"summary": ...}`.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let provider = &self.provider;
        let value = self
            .cache
            .get_or_compute(text, Operation::Summarize.as_str(), move || async move {
                let summary = provider
                    .generate(&prompts::summarize_prompt(text), GenerateOptions::default())
                    .await?;
                Ok::<_, DocaiError>(json!({ "summary": summary }))
            })
            .await?;
        Ok(value["summary"].as_str().unwrap_or_default().to_string())
    }

    /// Embed `text`. Cached as `{"values": [...]}`.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let provider = &self.provider;
        let value = self
            .cache
            .get_or_compute(text, Operation::Embeddings.as_str(), move || async move {
                let values = provider.embed(text).await?;
                Ok::<_, DocaiError>(json!({ "values": values }))
            })
            .await?;
        let values = value["values"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_f64().map(|f| f as f32))
                    .collect()
            })
            .unwrap_or_default();
        debug!(dimensions = value["values"].as_array().map_or(0, Vec::len), "Embedding ready");
        Ok(values)
    }
}

async fn request_classification(
    provider: &dyn LLMProvider,
    text: &str,
) -> Result<Classification> {
    let raw = provider
        .generate(&prompts::classify_prompt(text), GenerateOptions::json())
        .await?;
    serde_json::from_value(prompts::parse_json_response(&raw)?)
        .map_err(|e| DocaiError::Provider(format!("Unexpected classification payload: {e}")))
}
