//! LLM provider boundary.
//!
//! The rest of the crate treats the model as an opaque
//! `prompt -> text | json` and `text -> vector` function behind
//! [`LLMProvider`].

pub mod gemini;

use async_trait::async_trait;

use crate::error::{DocaiError, Result};

pub use gemini::GeminiProvider;

/// Per-call generation options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    /// Ask the model for a JSON response body.
    pub json_response: bool,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerateOptions {
    /// Options for a JSON-mode call.
    pub fn json() -> Self {
        Self {
            json_response: true,
            ..Default::default()
        }
    }
}

/// A text-generation and embedding backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for a single-turn prompt.
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> Result<String>;

    /// Compute an embedding vector for `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Short provider identifier for logs.
    fn name(&self) -> &str;

    /// Model used for [`generate`](Self::generate).
    fn default_model(&self) -> &str;
}

/// Map an HTTP error status from a provider onto a [`DocaiError`].
pub fn parse_provider_error(status: u16, message: &str) -> DocaiError {
    match status {
        401 | 403 => DocaiError::Auth(format!("HTTP {status}: {message}")),
        429 => DocaiError::RateLimited(format!("HTTP {status}: {message}")),
        _ => DocaiError::Provider(format!("HTTP {status}: {message}")),
    }
}
