//! DocAI command-line entry point.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docai::config::{Config, LogFormat, LoggingConfig};

use cli::{Cli, Commands};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => {
            let mut config = Config::load_from_path(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            config.apply_env_overrides();
            config
        }
        None => Config::load().with_context(|| "Failed to load configuration")?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { bind, port } => cli::serve::cmd_serve(config, bind, port).await,
        Commands::Cache { action } => cli::cache::cmd_cache(config, action).await,
        Commands::Classify { file } => cli::documents::cmd_classify(config, file).await,
        Commands::Extract { file, doc_type } => {
            cli::documents::cmd_extract(config, file, doc_type).await
        }
        Commands::Summarize { file } => cli::documents::cmd_summarize(config, file).await,
        Commands::Embed { file } => cli::documents::cmd_embed(config, file).await,
        Commands::Analyze {
            file,
            override_type,
            summary,
            embeddings,
        } => cli::documents::cmd_analyze(config, file, override_type, summary, embeddings).await,
    }
}
