//! `docai cache` command handler.

use anyhow::Result;
use tracing::warn;

use docai::cache::{CacheStats, Operation};
use docai::config::Config;

use super::common::{build_cache, build_intelligence};
use super::CacheAction;

/// Handle `docai cache` subcommands.
pub(crate) async fn cmd_cache(config: Config, action: CacheAction) -> Result<()> {
    let cache = build_cache(&config);

    match action {
        CacheAction::Stats { json } => {
            let stats = cache.stats();
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "dir": cache.dir(),
                        "total_entries": stats.total_entries,
                        "total_size_kb": stats.total_size_kb(),
                        "by_operation": stats.by_operation,
                    }))?
                );
            } else {
                println!("Cache directory: {}", cache.dir().display());
                print!("{}", format_stats(&stats));
            }
        }
        CacheAction::Clear { operation } => {
            let operation = normalize_operation(operation);
            if let Some(Err(e)) = operation.as_deref().map(str::parse::<Operation>) {
                warn!("{e}; clearing it as a custom namespace");
            }
            let deleted = cache.clear(operation.as_deref());
            match operation {
                Some(op) => println!("Cleared {deleted} cache entries for operation: {op}"),
                None => println!("Cleared {deleted} cache entries."),
            }
        }
        CacheAction::Warm => {
            let intelligence = build_intelligence(&config, cache.clone())?;
            for sample in intelligence.warm().await {
                println!(
                    "{:<10} -> {:<16} ({:.2})",
                    sample.sample_type, sample.classified_as, sample.confidence
                );
            }
            println!("Cache now holds {} entries.", cache.stats().total_entries);
            cache.metrics().emit("cache_warm");
        }
    }

    Ok(())
}

/// Trim the tag; a blank tag means every operation.
fn normalize_operation(operation: Option<String>) -> Option<String> {
    operation
        .map(|op| op.trim().to_string())
        .filter(|op| !op.is_empty())
}

/// Render stats as an aligned table.
fn format_stats(stats: &CacheStats) -> String {
    let mut out = format!(
        "Entries: {}\nSize:    {:.2} KB\n",
        stats.total_entries,
        stats.total_size_kb()
    );
    if stats.by_operation.is_empty() {
        return out;
    }
    out.push_str(&format!("\n{:<16} {:>8}\n", "Operation", "Entries"));
    out.push_str(&format!("{}\n", "-".repeat(25)));
    for (op, count) in &stats.by_operation {
        out.push_str(&format!("{:<16} {:>8}\n", op, count));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_format_stats_empty() {
        let out = format_stats(&CacheStats::default());
        assert_eq!(out, "Entries: 0\nSize:    0.00 KB\n");
    }

    #[test]
    fn test_format_stats_lists_operations_sorted() {
        let stats = CacheStats {
            total_entries: 3,
            total_size_bytes: 2048,
            by_operation: BTreeMap::from([
                ("extract".to_string(), 1),
                ("classify".to_string(), 2),
            ]),
        };
        let out = format_stats(&stats);
        assert!(out.contains("Size:    2.00 KB"));
        let classify = out.find("classify").unwrap();
        let extract = out.find("extract").unwrap();
        assert!(classify < extract);
    }

    #[test]
    fn test_normalize_operation() {
        assert_eq!(normalize_operation(Some(" extract ".into())).as_deref(), Some("extract"));
        assert_eq!(normalize_operation(Some("  ".into())), None);
        assert_eq!(normalize_operation(None), None);
    }

    #[tokio::test]
    async fn test_cmd_cache_clear_blank_operation_clears_all() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.dir = dir.path().to_path_buf();
        let cache = build_cache(&config);
        cache.set("a", "classify", &serde_json::json!(1));
        cache.set("b", "extract", &serde_json::json!(2));

        cmd_cache(
            config,
            CacheAction::Clear {
                operation: Some(" ".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(cache.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_cmd_cache_clear_scoped() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.dir = dir.path().to_path_buf();
        let cache = build_cache(&config);
        cache.set("a", "classify", &serde_json::json!(1));
        cache.set("b", "extract", &serde_json::json!(2));

        cmd_cache(
            config,
            CacheAction::Clear {
                operation: Some(" classify ".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(cache.stats().by_operation.get("classify"), None);
        assert_eq!(cache.stats().by_operation["extract"], 1);
    }
}
