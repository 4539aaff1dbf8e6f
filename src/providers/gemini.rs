//! Gemini REST provider.
//!
//! Auth priority: config key → GEMINI_API_KEY → GOOGLE_API_KEY
//!
//! Thinking model support: Gemini 2.5 models return parts tagged `thought: true`.
//! This provider filters those out and only returns the final non-thought text.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::GeminiConfig;
use crate::error::{DocaiError, Result};

use super::{parse_provider_error, GenerateOptions, LLMProvider};

/// Gemini v1beta REST API base.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ── Auth ─────────────────────────────────────────────────────────────────────

/// API key for the Gemini REST API, sent as the `x-goog-api-key` header.
#[derive(Clone)]
pub struct GeminiApiKey(String);

impl std::fmt::Debug for GeminiApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GeminiApiKey([REDACTED])")
    }
}

impl GeminiApiKey {
    /// Resolve the key in priority order.
    ///
    /// 1. `explicit_key`: value from config file
    /// 2. `env_key`: value of `GEMINI_API_KEY` or `GOOGLE_API_KEY`
    pub fn resolve(explicit_key: Option<&str>, env_key: Option<&str>) -> Option<Self> {
        explicit_key
            .filter(|k| !k.is_empty())
            .or_else(|| env_key.filter(|k| !k.is_empty()))
            .map(|k| Self(k.to_string()))
    }
}

// ── Provider ──────────────────────────────────────────────────────────────────

/// Gemini provider speaking the REST API directly.
pub struct GeminiProvider {
    api_key: GeminiApiKey,
    model: String,
    embed_model: String,
    base_url: String,
    client: Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &self.api_key)
            .field("model", &self.model)
            .field("embed_model", &self.embed_model)
            .finish()
    }
}

impl GeminiProvider {
    /// Build a provider with an explicit key and default timeout.
    pub fn new_with_key(api_key: &str, model: &str, embed_model: &str) -> Result<Self> {
        Self::build(
            GeminiApiKey(api_key.to_string()),
            model,
            embed_model,
            Duration::from_secs(120),
        )
    }

    /// Build from config, resolving the key from config or environment.
    ///
    /// Returns `Ok(None)` when no credentials are available.
    pub fn from_config(config: &GeminiConfig) -> Result<Option<Self>> {
        let env_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok();
        let Some(api_key) = GeminiApiKey::resolve(config.api_key.as_deref(), env_key.as_deref())
        else {
            return Ok(None);
        };
        Self::build(
            api_key,
            &config.model,
            &config.embed_model,
            Duration::from_secs(config.timeout_secs.max(1)),
        )
        .map(Some)
    }

    fn build(
        api_key: GeminiApiKey,
        model: &str,
        embed_model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocaiError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            api_key,
            model: strip_models_prefix(model).to_string(),
            embed_model: strip_models_prefix(embed_model).to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API base (proxies, test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Build a `generateContent` request body for a single user turn.
    pub fn build_generate_body(prompt: &str, options: &GenerateOptions) -> Value {
        let mut generation_config = json!({});
        if options.json_response {
            generation_config["responseMimeType"] = json!("application/json");
        }
        if let Some(temp) = options.temperature {
            generation_config["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = options.max_output_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": generation_config
        })
    }

    /// Build an `embedContent` request body.
    pub fn build_embed_body(&self, text: &str) -> Value {
        json!({
            "model": format!("models/{}", self.embed_model),
            "content": { "parts": [{ "text": text }] }
        })
    }

    /// Extract final answer text from a Gemini API response.
    ///
    /// Gemini 2.5 thinking models return parts tagged `"thought": true`.
    /// Those are intermediate reasoning steps and must be filtered out.
    /// If no non-thought parts exist (unusual), we fall back to returning
    /// the thought text so the caller always gets *something*.
    pub fn extract_text(response: &Value) -> Option<String> {
        let parts = response["candidates"][0]["content"]["parts"].as_array()?;

        let final_parts: Vec<&str> = parts
            .iter()
            .filter(|p| !p["thought"].as_bool().unwrap_or(false))
            .filter_map(|p| p["text"].as_str())
            .collect();

        if !final_parts.is_empty() {
            return Some(final_parts.join(""));
        }

        let thought_parts: Vec<&str> = parts.iter().filter_map(|p| p["text"].as_str()).collect();

        if !thought_parts.is_empty() {
            Some(thought_parts.join(""))
        } else {
            None
        }
    }

    /// Extract the embedding vector from an `embedContent` response.
    pub fn extract_embedding(response: &Value) -> Option<Vec<f32>> {
        response["embedding"]["values"]
            .as_array()?
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect()
    }

    fn api_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// POST `body` to `url` and return the parsed JSON response.
    async fn post_json(&self, url: String, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key.0)
            .json(body)
            .send()
            .await
            .map_err(|e| DocaiError::Provider(format!("Gemini request failed: {}", e)))?;

        if response.status().is_success() {
            return response.json().await.map_err(|e| {
                DocaiError::Provider(format!("Failed to parse Gemini response: {}", e))
            });
        }

        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();

        // Try to extract a useful message from the Gemini error body.
        let body_msg = serde_json::from_str::<Value>(&error_text)
            .ok()
            .and_then(|v| {
                v["error"]["message"]
                    .as_str()
                    .map(|s| format!("Gemini API error: {}", s))
            })
            .unwrap_or_else(|| format!("Gemini API error: {}", error_text));

        Err(parse_provider_error(status, &body_msg))
    }
}

/// Accept both `gemini-2.5-flash` and `models/gemini-2.5-flash`.
fn strip_models_prefix(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> Result<String> {
        let body = Self::build_generate_body(prompt, &options);
        debug!(model = %self.model, json = options.json_response, "Gemini generateContent request");

        let json = self
            .post_json(self.api_url(&self.model, "generateContent"), &body)
            .await?;
        Self::extract_text(&json)
            .ok_or_else(|| DocaiError::Provider("Gemini response contained no text".into()))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = self.build_embed_body(text);
        debug!(model = %self.embed_model, "Gemini embedContent request");

        let json = self
            .post_json(self.api_url(&self.embed_model, "embedContent"), &body)
            .await?;
        Self::extract_embedding(&json)
            .ok_or_else(|| DocaiError::Provider("Gemini response contained no embedding".into()))
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
