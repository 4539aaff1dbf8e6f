//! Content-addressed, operation-scoped persistent cache for LLM results.
//!
//! Each entry lives in its own file, `<dir>/<key>.json`, where `key` is
//! [`derive_key`] of the caller's text and operation tag. Records are written
//! to a temporary file in the same directory and renamed into place, so a
//! reader sees either the previous record or the new one, never a partial
//! write.
//!
//! The cache never fails a caller: unreadable or malformed records read as a
//! miss, and write failures are logged and counted. Entries never expire;
//! they are removed only by [`ContentCache::clear`].

use std::collections::BTreeMap;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::key::{derive_key, short_key};
use super::metrics::{CacheCounters, CacheMetrics};
use crate::config::CacheConfig;
use crate::error::Result;

const RECORD_EXTENSION: &str = "json";

/// A single persisted cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Operation tag that produced `result`.
    pub operation: String,
    /// Storage key. Absent in records written before the field existed.
    #[serde(default)]
    pub cache_key: Option<String>,
    /// RFC 3339 write timestamp.
    pub cached_at: String,
    /// Character length of the text the key was derived from.
    pub text_length: usize,
    /// The cached payload, stored verbatim.
    pub result: Value,
}

/// Outcome of reading one record from storage.
#[derive(Debug)]
pub enum ReadOutcome {
    Found(CacheRecord),
    Missing,
    /// The record exists but does not parse as a [`CacheRecord`].
    Corrupt(String),
    /// The record or its directory could not be read.
    Unavailable(String),
}

/// Aggregate statistics from a full scan of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of record files, parseable or not.
    pub total_entries: usize,
    /// Sum of record file sizes in bytes.
    pub total_size_bytes: u64,
    /// Entry count per operation tag, parseable records only.
    pub by_operation: BTreeMap<String, usize>,
}

impl CacheStats {
    /// Total size in KiB rounded to two decimals.
    pub fn total_size_kb(&self) -> f64 {
        (self.total_size_bytes as f64 / 1024.0 * 100.0).round() / 100.0
    }
}

/// Persistent LLM result cache.
///
/// Construct once per process and share as `Arc<ContentCache>`.
pub struct ContentCache {
    dir: PathBuf,
    dedupe_inflight: bool,
    metrics: CacheMetrics,
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("dir", &self.dir)
            .field("dedupe_inflight", &self.dedupe_inflight)
            .finish()
    }
}

impl ContentCache {
    /// Create a cache rooted at `dir`, creating the directory if needed.
    ///
    /// A directory that cannot be created is not an error here; every
    /// operation degrades as if the store were empty.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "Failed to create cache directory");
        }
        Self {
            dir,
            dedupe_inflight: true,
            metrics: CacheMetrics::new(),
            inflight: DashMap::new(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.dir.clone()).with_inflight_dedupe(config.dedupe_inflight)
    }

    /// Toggle per-key serialization in [`get_or_compute`](Self::get_or_compute).
    pub fn with_inflight_dedupe(mut self, enabled: bool) -> Self {
        self.dedupe_inflight = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn counters(&self) -> CacheCounters {
        self.metrics.snapshot()
    }

    /// Path of the record file for `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{RECORD_EXTENSION}"))
    }

    /// Read the raw record stored under `key`.
    pub fn read(&self, key: &str) -> ReadOutcome {
        read_record(&self.record_path(key))
    }

    /// Look up the cached result for `(text, operation)`.
    pub fn get(&self, text: &str, operation: &str) -> Option<Value> {
        let key = derive_key(text, operation);
        match self.read(&key) {
            ReadOutcome::Found(record) => {
                self.metrics.record_hit();
                debug!(operation, key = short_key(&key), "Cache hit");
                Some(record.result)
            }
            ReadOutcome::Missing => {
                self.metrics.record_miss();
                debug!(operation, key = short_key(&key), "Cache miss");
                None
            }
            ReadOutcome::Corrupt(reason) => {
                self.metrics.record_corrupt();
                self.metrics.record_miss();
                warn!(
                    operation,
                    key = short_key(&key),
                    reason = %reason,
                    "Cache record is corrupt, treating as miss"
                );
                None
            }
            ReadOutcome::Unavailable(reason) => {
                self.metrics.record_miss();
                warn!(
                    operation,
                    key = short_key(&key),
                    reason = %reason,
                    "Cache storage unavailable, treating as miss"
                );
                None
            }
        }
    }

    /// Store `result` for `(text, operation)`, replacing any existing entry.
    ///
    /// Failures are logged and counted, never returned.
    pub fn set(&self, text: &str, operation: &str, result: &Value) {
        let key = derive_key(text, operation);
        let record = CacheRecord {
            operation: operation.to_string(),
            cache_key: Some(key.clone()),
            cached_at: chrono::Utc::now().to_rfc3339(),
            text_length: text.chars().count(),
            result: result.clone(),
        };
        match self.write_record(&key, &record) {
            Ok(()) => {
                self.metrics.record_write();
                debug!(operation, key = short_key(&key), "Cached result");
            }
            Err(e) => {
                self.metrics.record_write_error();
                warn!(
                    operation,
                    key = short_key(&key),
                    error = %e,
                    "Failed to write cache record"
                );
            }
        }
    }

    /// Cache-aside lookup: return the cached result, or run `compute`, store
    /// its successful output and return it.
    ///
    /// Errors from `compute` are returned unchanged and nothing is stored, so
    /// the next call retries upstream. With in-flight dedupe enabled, callers
    /// racing on the same key wait for the first one and reuse its result.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        text: &str,
        operation: &str,
        compute: F,
    ) -> std::result::Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
    {
        if let Some(hit) = self.get(text, operation) {
            return Ok(hit);
        }

        if !self.dedupe_inflight {
            let value = compute().await?;
            self.set(text, operation, &value);
            return Ok(value);
        }

        let slot = InflightSlot {
            map: &self.inflight,
            key: derive_key(text, operation),
        };
        // Declared after `slot` so the handle is released before its cleanup.
        let lock = slot.handle();
        let _guard = lock.lock().await;
        if let ReadOutcome::Found(record) = self.read(slot.key()) {
            self.metrics.record_hit();
            debug!(
                operation,
                key = short_key(slot.key()),
                "Cache filled by concurrent caller"
            );
            return Ok(record.result);
        }
        let value = compute().await?;
        self.set(text, operation, &value);
        Ok(value)
    }

    /// Delete entries. `None` removes everything; `Some(op)` removes only
    /// parseable entries whose stored operation equals `op`.
    ///
    /// Returns the number of deleted entries.
    pub fn clear(&self, operation: Option<&str>) -> usize {
        let files = match self.record_files() {
            Ok(files) => files,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to list cache directory");
                return 0;
            }
        };

        let mut deleted = 0;
        for path in files {
            if let Some(op) = operation {
                match read_record(&path) {
                    ReadOutcome::Found(record) if record.operation == op => {}
                    ReadOutcome::Found(_) | ReadOutcome::Missing => continue,
                    ReadOutcome::Corrupt(reason) | ReadOutcome::Unavailable(reason) => {
                        debug!(path = %path.display(), reason = %reason, "Skipping unreadable record during filtered clear");
                        continue;
                    }
                }
            }
            match std::fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete cache record");
                }
            }
        }

        info!(
            deleted,
            operation = operation.unwrap_or("*"),
            "Cleared cache entries"
        );
        deleted
    }

    /// Scan the store and aggregate entry counts and sizes.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        let files = match self.record_files() {
            Ok(files) => files,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to list cache directory");
                return stats;
            }
        };

        for path in files {
            stats.total_entries += 1;
            if let Ok(meta) = std::fs::metadata(&path) {
                stats.total_size_bytes += meta.len();
            }
            if let ReadOutcome::Found(record) = read_record(&path) {
                *stats.by_operation.entry(record.operation).or_insert(0) += 1;
            }
        }
        stats
    }

    // -- private helpers ---------------------------------------------------

    /// All `*.json` files in the cache directory. A missing directory is empty.
    fn record_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == RECORD_EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn write_record(&self, key: &str, record: &CacheRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_vec_pretty(record)?;
        // Temp names never end in `.json`, so scans skip them.
        let mut tmp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(&data)?;
        tmp.flush()?;
        tmp.persist(self.record_path(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Membership in the in-flight map for one key.
///
/// Dropping the slot removes the map entry once no caller holds a handle,
/// including when the owning future is cancelled mid-compute.
struct InflightSlot<'a> {
    map: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
}

impl InflightSlot<'_> {
    fn key(&self) -> &str {
        &self.key
    }

    fn handle(&self) -> Arc<Mutex<()>> {
        self.map.entry(self.key.clone()).or_default().clone()
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        self.map
            .remove_if(&self.key, |_, l| Arc::strong_count(l) == 1);
    }
}

fn read_record(path: &Path) -> ReadOutcome {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ReadOutcome::Missing,
        Err(e) => return ReadOutcome::Unavailable(e.to_string()),
    };
    match serde_json::from_slice::<CacheRecord>(&data) {
        Ok(record) => ReadOutcome::Found(record),
        Err(e) => ReadOutcome::Corrupt(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn test_cache() -> (ContentCache, TempDir) {
        let tmp = TempDir::new().unwrap();
        let cache = ContentCache::new(tmp.path().join("gemini"));
        (cache, tmp)
    }

    fn write_raw(cache: &ContentCache, name: &str, contents: &str) {
        std::fs::write(cache.dir().join(name), contents).unwrap();
    }

    #[test]
    fn test_miss_then_hit() {
        let (cache, _tmp) = test_cache();
        assert!(cache.get("hello world", "classify").is_none());
        cache.set("hello world", "classify", &json!({"document_type": "report"}));
        assert_eq!(
            cache.get("hello world", "classify"),
            Some(json!({"document_type": "report"}))
        );
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let (cache, _tmp) = test_cache();
        let payloads = [
            json!({"vendor": {"name": "ACME", "lines": [1, 2.5, null]}, "paid": false}),
            json!("plain text summary"),
            json!([0.1, -0.2, 0.3]),
        ];
        for (i, payload) in payloads.iter().enumerate() {
            let text = format!("document {i}");
            cache.set(&text, "extract", payload);
            assert_eq!(cache.get(&text, "extract").as_ref(), Some(payload));
        }
    }

    #[test]
    fn test_overwrite_replaces_result() {
        let (cache, _tmp) = test_cache();
        cache.set("text", "summarize", &json!({"summary": "first"}));
        cache.set("text", "summarize", &json!({"summary": "second"}));
        assert_eq!(
            cache.get("text", "summarize"),
            Some(json!({"summary": "second"}))
        );
        assert_eq!(cache.stats().total_entries, 1);
    }

    #[test]
    fn test_whitespace_variants_share_entry() {
        let (cache, _tmp) = test_cache();
        cache.set("INVOICE\n  Total:\t$10", "classify", &json!({"document_type": "invoice"}));
        assert!(cache.get("INVOICE Total: $10", "classify").is_some());
        assert!(cache.get("  INVOICE Total: $10\n", "classify").is_some());
    }

    #[test]
    fn test_operations_do_not_share_entries() {
        let (cache, _tmp) = test_cache();
        cache.set("same text", "classify", &json!({"document_type": "invoice"}));
        assert!(cache.get("same text", "extract").is_none());
    }

    #[test]
    fn test_record_layout_on_disk() {
        let (cache, _tmp) = test_cache();
        let text = "Grüße  aus Berlin";
        cache.set(text, "classify", &json!({"document_type": "unknown"}));

        let key = derive_key(text, "classify");
        let raw = std::fs::read_to_string(cache.record_path(&key)).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["operation"], "classify");
        assert_eq!(value["cache_key"], key.as_str());
        assert_eq!(value["text_length"], 17);
        assert_eq!(value["result"]["document_type"], "unknown");
        let cached_at = value["cached_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(cached_at).is_ok());
    }

    #[test]
    fn test_legacy_record_without_cache_key_is_a_hit() {
        let (cache, _tmp) = test_cache();
        let key = derive_key("legacy text", "classify");
        write_raw(
            &cache,
            &format!("{key}.json"),
            r#"{"operation": "classify", "cached_at": "2024-01-15T10:00:00.123456",
                "text_length": 11, "result": {"document_type": "receipt", "confidence": 0.8}}"#,
        );
        assert_eq!(
            cache.get("legacy text", "classify"),
            Some(json!({"document_type": "receipt", "confidence": 0.8}))
        );
    }

    #[test]
    fn test_corrupt_record_reads_as_miss() {
        let (cache, _tmp) = test_cache();
        let key = derive_key("broken", "classify");
        write_raw(&cache, &format!("{key}.json"), "{\"operation\": \"classify\", ");
        assert!(matches!(cache.read(&key), ReadOutcome::Corrupt(_)));
        assert!(cache.get("broken", "classify").is_none());
        let counters = cache.counters();
        assert_eq!(counters.corrupt, 1);
        assert_eq!(counters.misses, 1);
        assert_eq!(counters.hits, 0);
    }

    #[test]
    fn test_record_missing_result_is_corrupt() {
        let (cache, _tmp) = test_cache();
        let key = derive_key("partial", "classify");
        write_raw(
            &cache,
            &format!("{key}.json"),
            r#"{"operation": "classify", "cached_at": "x", "text_length": 7}"#,
        );
        assert!(cache.get("partial", "classify").is_none());
    }

    #[test]
    fn test_unavailable_storage_degrades() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "file in the way").unwrap();
        let cache = ContentCache::new(&blocker);

        cache.set("text", "classify", &json!({"document_type": "invoice"}));
        assert!(cache.get("text", "classify").is_none());
        assert_eq!(cache.counters().write_errors, 1);
        assert_eq!(cache.clear(None), 0);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_scoped_clear_keeps_other_operations() {
        let (cache, _tmp) = test_cache();
        cache.set("doc a", "classify", &json!({"document_type": "invoice"}));
        cache.set("doc b", "classify", &json!({"document_type": "receipt"}));
        cache.set("doc a", "extract", &json!({"total": 10}));

        assert_eq!(cache.clear(Some("classify")), 2);
        assert!(cache.get("doc a", "classify").is_none());
        assert_eq!(cache.get("doc a", "extract"), Some(json!({"total": 10})));
        assert_eq!(cache.stats().total_entries, 1);
    }

    #[test]
    fn test_scoped_clear_skips_corrupt_records() {
        let (cache, _tmp) = test_cache();
        cache.set("doc", "classify", &json!({"document_type": "invoice"}));
        write_raw(&cache, "deadbeefdeadbeefdeadbeefdeadbeef.json", "not json");

        assert_eq!(cache.clear(Some("classify")), 1);
        assert!(cache
            .dir()
            .join("deadbeefdeadbeefdeadbeefdeadbeef.json")
            .exists());
    }

    #[test]
    fn test_full_clear_removes_everything() {
        let (cache, _tmp) = test_cache();
        cache.set("a", "classify", &json!({}));
        cache.set("b", "summarize", &json!({"summary": "b"}));
        write_raw(&cache, "corrupt.json", "{{{");

        assert_eq!(cache.clear(None), 3);
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_size_bytes, 0);
        assert!(stats.by_operation.is_empty());
    }

    #[test]
    fn test_clear_on_unknown_operation_deletes_nothing() {
        let (cache, _tmp) = test_cache();
        cache.set("a", "classify", &json!({}));
        assert_eq!(cache.clear(Some("translate")), 0);
        assert_eq!(cache.stats().total_entries, 1);
    }

    #[test]
    fn test_stats_accuracy() {
        let (cache, _tmp) = test_cache();
        for i in 0..3 {
            cache.set(&format!("classify {i}"), "classify", &json!({"i": i}));
        }
        for i in 0..2 {
            cache.set(&format!("extract {i}"), "extract", &json!({"i": i}));
        }
        cache.set("vector", "embeddings", &json!({"values": [0.1, 0.2]}));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 6);
        assert_eq!(stats.by_operation.values().sum::<usize>(), 6);
        assert_eq!(stats.by_operation["classify"], 3);
        assert_eq!(stats.by_operation["extract"], 2);
        assert_eq!(stats.by_operation["embeddings"], 1);
        assert!(stats.total_size_bytes > 0);
    }

    #[test]
    fn test_stats_counts_corrupt_in_totals_only() {
        let (cache, _tmp) = test_cache();
        cache.set("a", "classify", &json!({}));
        write_raw(&cache, "corrupt.json", "garbage");

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.by_operation.values().sum::<usize>(), 1);
        let corrupt_len = std::fs::metadata(cache.dir().join("corrupt.json"))
            .unwrap()
            .len();
        assert!(stats.total_size_bytes > corrupt_len);
    }

    #[test]
    fn test_stats_ignores_non_record_files() {
        let (cache, _tmp) = test_cache();
        write_raw(&cache, ".abc123.tmp", "half-written");
        write_raw(&cache, "notes.txt", "hello");
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_stats_on_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let cache = ContentCache::new(tmp.path().join("store"));
        std::fs::remove_dir_all(cache.dir()).unwrap();
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.clear(None), 0);
    }

    #[test]
    fn test_set_recreates_missing_directory() {
        let (cache, _tmp) = test_cache();
        std::fs::remove_dir_all(cache.dir()).unwrap();
        cache.set("text", "classify", &json!({"ok": true}));
        assert_eq!(cache.get("text", "classify"), Some(json!({"ok": true})));
    }

    #[test]
    fn test_total_size_kb_rounding() {
        let stats = CacheStats {
            total_size_bytes: 1536,
            ..Default::default()
        };
        assert_eq!(stats.total_size_kb(), 1.5);
        let stats = CacheStats {
            total_size_bytes: 1000,
            ..Default::default()
        };
        assert_eq!(stats.total_size_kb(), 0.98);
    }

    #[tokio::test]
    async fn test_get_or_compute_calls_upstream_once() {
        let (cache, _tmp) = test_cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value = cache
                .get_or_compute("INVOICE\nTotal: $10", "classify", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(json!({"document_type": "invoice", "confidence": 0.9}))
                })
                .await
                .unwrap();
            assert_eq!(value["document_type"], "invoice");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_does_not_cache_failures() {
        let (cache, _tmp) = test_cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let first = cache
            .get_or_compute("text", "summarize", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<Value, _>("upstream down")
            })
            .await;
        assert_eq!(first.unwrap_err(), "upstream down");
        assert!(cache.get("text", "summarize").is_none());

        let second = cache
            .get_or_compute("text", "summarize", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &str>(json!({"summary": "ok"}))
            })
            .await
            .unwrap();
        assert_eq!(second, json!({"summary": "ok"}));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_collapse_into_one_call() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(ContentCache::new(tmp.path()));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("same document", "classify", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        Ok::<_, String>(json!({"document_type": "report"}))
                    })
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap()["document_type"], "report");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.inflight.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_compute_releases_inflight_entry() {
        let (cache, _tmp) = test_cache();

        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            cache.get_or_compute("slow document", "classify", || async {
                tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                Ok::<_, String>(json!({"document_type": "report"}))
            }),
        )
        .await;
        assert!(cancelled.is_err());
        assert!(cache.inflight.is_empty());
        assert!(cache.get("slow document", "classify").is_none());

        // The key is usable again afterwards.
        let value = cache
            .get_or_compute("slow document", "classify", || async {
                Ok::<_, String>(json!({"document_type": "report"}))
            })
            .await
            .unwrap();
        assert_eq!(value["document_type"], "report");
        assert!(cache.inflight.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_keeps_entry_for_owner() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(ContentCache::new(tmp.path()));

        let owner = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_compute("shared", "extract", || async {
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                        Ok::<_, String>(json!({"total": 1}))
                    })
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let waiter = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            cache.get_or_compute("shared", "extract", || async {
                Ok::<_, String>(json!({"total": 2}))
            }),
        )
        .await;
        assert!(waiter.is_err());
        assert_eq!(cache.inflight.len(), 1);

        assert_eq!(owner.await.unwrap().unwrap(), json!({"total": 1}));
        assert!(cache.inflight.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_compute_without_dedupe() {
        let tmp = TempDir::new().unwrap();
        let cache = ContentCache::new(tmp.path()).with_inflight_dedupe(false);
        let value = cache
            .get_or_compute("text", "extract", || async {
                Ok::<_, String>(json!({"a": 1}))
            })
            .await
            .unwrap();
        assert_eq!(value, json!({"a": 1}));
        assert_eq!(cache.get("text", "extract"), Some(json!({"a": 1})));
        assert!(cache.inflight.is_empty());
    }

    #[test]
    fn test_from_config() {
        let tmp = TempDir::new().unwrap();
        let config = CacheConfig {
            dir: tmp.path().join("cfg-cache"),
            dedupe_inflight: false,
        };
        let cache = ContentCache::from_config(&config);
        assert_eq!(cache.dir(), config.dir.as_path());
        assert!(!cache.dedupe_inflight);
        assert!(cache.dir().is_dir());
    }
}
