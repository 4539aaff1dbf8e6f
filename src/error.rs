//! Error types for DocAI.
//!
//! Library code returns [`Result<T>`]; the CLI layer wraps these in
//! `anyhow` with additional context.

use thiserror::Error;

/// Errors surfaced by the DocAI library.
#[derive(Debug, Error)]
pub enum DocaiError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The LLM provider returned an error or an unusable response.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The LLM provider rejected the credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The LLM provider is throttling requests.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DocaiError>;
