//! Command-line interface definitions.

pub mod cache;
pub mod common;
pub mod documents;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "docai")]
#[command(version)]
#[command(about = "Document classification and extraction with a persistent LLM cache")]
pub struct Cli {
    /// Config file (default: ~/.docai/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Inspect and manage the content cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Classify a document
    Classify {
        /// Text file to read, or - for stdin
        file: PathBuf,
    },
    /// Extract structured fields from a document
    Extract {
        /// Text file to read, or - for stdin
        file: PathBuf,
        /// Document type (classified automatically when omitted)
        #[arg(long)]
        doc_type: Option<String>,
    },
    /// Summarize a document
    Summarize {
        /// Text file to read, or - for stdin
        file: PathBuf,
    },
    /// Compute an embedding vector for a document
    Embed {
        /// Text file to read, or - for stdin
        file: PathBuf,
    },
    /// Run the full analysis pipeline on a document
    Analyze {
        /// Text file to read, or - for stdin
        file: PathBuf,
        /// Extract as this type instead of the detected one
        #[arg(long)]
        override_type: Option<String>,
        /// Include a summary
        #[arg(long)]
        summary: bool,
        /// Include embeddings
        #[arg(long)]
        embeddings: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show entry counts and sizes
    Stats {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete cache entries
    Clear {
        /// Only delete entries for this operation (classify, extract, summarize, embeddings)
        #[arg(long)]
        operation: Option<String>,
    },
    /// Classify built-in sample documents to pre-populate the cache
    Warm,
}
