//! DocAI: document classification and extraction backed by an LLM, with a
//! persistent content-addressed cache in front of every model call.
//!
//! ```
//! use docai::cache::ContentCache;
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let cache = ContentCache::new(dir.path());
//!
//! cache.set("INVOICE\nTotal: $10", "classify", &json!({"document_type": "invoice"}));
//! let hit = tokio_test::block_on(async {
//!     cache
//!         .get_or_compute("INVOICE   Total: $10", "classify", || async {
//!             Err::<serde_json::Value, ()>(())
//!         })
//!         .await
//! });
//! assert_eq!(hit.unwrap()["document_type"], "invoice");
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod intelligence;
pub mod providers;

pub use cache::ContentCache;
pub use config::Config;
pub use error::{DocaiError, Result};
pub use intelligence::DocumentIntelligence;
