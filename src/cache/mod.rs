//! Content-addressed persistent cache for LLM results.

pub mod content_cache;
pub mod key;
pub mod metrics;

pub use content_cache::{CacheRecord, CacheStats, ContentCache, ReadOutcome};
pub use key::{composite_text, derive_key, normalize, Operation};
pub use metrics::{CacheCounters, CacheMetrics};
