//! HTTP server configuration types.

use serde::{Deserialize, Serialize};

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (default: 127.0.0.1).
    pub bind: String,
    /// Port for the API server.
    pub port: u16,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// `bind:port` socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
