//! Document command handlers: classify, extract, summarize, embed, analyze.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use docai::config::Config;
use docai::intelligence::{AnalyzeRequest, DocumentIntelligence};

use super::common::{build_cache, build_intelligence, read_input};

fn setup(config: &Config, file: &Path) -> Result<(DocumentIntelligence, String)> {
    let text = read_input(file)?;
    let intelligence = build_intelligence(config, build_cache(config))?;
    Ok((intelligence, text))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn cmd_classify(config: Config, file: PathBuf) -> Result<()> {
    let (ai, text) = setup(&config, &file)?;
    let result = ai
        .classify(&text)
        .await
        .with_context(|| "Classification failed")?;
    print_json(&result)?;
    ai.cache().metrics().emit("classify");
    Ok(())
}

pub(crate) async fn cmd_extract(
    config: Config,
    file: PathBuf,
    doc_type: Option<String>,
) -> Result<()> {
    let (ai, text) = setup(&config, &file)?;
    let doc_type = match doc_type {
        Some(t) => t,
        None => {
            ai.classify(&text)
                .await
                .with_context(|| "Classification failed")?
                .document_type
        }
    };
    let result = ai
        .extract(&text, &doc_type)
        .await
        .with_context(|| format!("Extraction as {doc_type} failed"))?;
    print_json(&result)?;
    ai.cache().metrics().emit("extract");
    Ok(())
}

pub(crate) async fn cmd_summarize(config: Config, file: PathBuf) -> Result<()> {
    let (ai, text) = setup(&config, &file)?;
    let summary = ai
        .summarize(&text)
        .await
        .with_context(|| "Summarization failed")?;
    println!("{}", summary.trim_end());
    ai.cache().metrics().emit("summarize");
    Ok(())
}

pub(crate) async fn cmd_embed(config: Config, file: PathBuf) -> Result<()> {
    let (ai, text) = setup(&config, &file)?;
    let values = ai.embed(&text).await.with_context(|| "Embedding failed")?;
    print_json(&values)?;
    ai.cache().metrics().emit("embed");
    Ok(())
}

pub(crate) async fn cmd_analyze(
    config: Config,
    file: PathBuf,
    override_type: Option<String>,
    include_summary: bool,
    include_embeddings: bool,
) -> Result<()> {
    let (ai, text) = setup(&config, &file)?;
    let request = AnalyzeRequest {
        text,
        override_type,
        include_summary,
        include_embeddings,
    };
    let report = ai.analyze(&request).await;
    print_json(&report)?;
    ai.cache().metrics().emit("analyze");
    Ok(())
}
