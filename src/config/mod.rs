//! Configuration for DocAI.
//!
//! Loaded from `~/.docai/config.json` when present. Every section is
//! optional and missing fields take their defaults. A handful of
//! environment variables override the file so containers can be configured
//! without one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::config::ServerConfig;
use crate::error::{DocaiError, Result};

/// Default Gemini model for classification, extraction and summaries.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Default Gemini embedding model.
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-004";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub gemini: GeminiConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Content cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one JSON record per cache key.
    pub dir: PathBuf,
    /// Collapse concurrent misses on the same key into one upstream call.
    pub dedupe_inflight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: Config::dir().join("cache").join("gemini"),
            dedupe_inflight: true,
        }
    }
}

/// Gemini provider settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key. Falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    pub api_key: Option<String>,
    pub model: String,
    pub embed_model: String,
    /// HTTP timeout for a single upstream request.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("embed_model", &self.embed_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Base directory: `~/.docai`.
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docai")
    }

    /// Default config file path: `~/.docai/config.json`.
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from the default path and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(&Self::path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(DocaiError::Config(format!(
                    "Failed to read config at {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&data).map_err(|e| {
            DocaiError::Config(format!(
                "Failed to parse config at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Apply `DOCAI_*` environment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides using `lookup` to resolve variable names.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("DOCAI_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(bind) = get("DOCAI_BIND") {
            self.server.bind = bind;
        }
        if let Some(port) = get("DOCAI_PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid DOCAI_PORT"),
            }
        }
        if let Some(format) = get("DOCAI_LOG_FORMAT") {
            match format.trim().to_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "text" => self.logging.format = LogFormat::Text,
                other => tracing::warn!(value = %other, "Ignoring invalid DOCAI_LOG_FORMAT"),
            }
        }
        if let Some(model) = get("DOCAI_GEMINI_MODEL") {
            self.gemini.model = model;
        }
    }
}
