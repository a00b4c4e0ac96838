mod config;
mod input;
mod output;
mod run;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use extract::{GenerationOptions, OllamaClient, ResponseParser};
use index::{ChunkEmbedder, EmbeddingClient, EmbeddingProvider};
use query::TaskSearchEngine;

use crate::config::AppConfig;
use crate::input::RunInput;
use crate::run::run_pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "pipeline",
    about = "Persona-driven retrieval and synthesis over extracted PDF chunks"
)]
struct Cli {
    /// Run descriptor JSON (documents, persona, job_to_be_done)
    #[arg(long, env = "PIPELINE_INPUT")]
    input: PathBuf,

    /// Directory of chunk record files produced by the PDF extractor
    #[arg(long, env = "PIPELINE_CHUNKS_DIR", default_value = "data/chunks")]
    chunks_dir: PathBuf,

    /// Optional JSON config file
    #[arg(long, env = "PIPELINE_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides output.dir from the config
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Overrides retrieval.top_k from the config
    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = AppConfig::load(cli.config.as_deref()).await?;
    if let Some(top_k) = cli.top_k {
        config.retrieval.top_k = top_k;
    }
    if let Some(dir) = cli.output_dir {
        config.output.dir = dir;
    }
    config.validate()?;

    let input = RunInput::read(&cli.input).await?;

    // Shared HTTP client for both Ollama capabilities
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let embedding_client = EmbeddingClient::new(
        config.embedding.base_url.clone(),
        config.embedding.model.clone(),
    )
    .with_client(http.clone());

    let dimension = match config.embedding.dimension {
        Some(dimension) => dimension,
        None => embedding_client
            .dimension()
            .await
            .context("Failed to probe embedding dimension")?,
    };

    let llm = OllamaClient::new(config.llm.base_url.clone(), config.llm.model.clone())
        .with_options(GenerationOptions {
            num_ctx: config.llm.context_window,
            temperature: config.llm.temperature,
            stop: config.llm.stop.clone(),
        })
        .with_client(http);

    let embedding_model = embedding_client.model().to_string();
    let llm_model = llm.model().to_string();

    let engine = TaskSearchEngine::new(
        ChunkEmbedder::new(embedding_client).with_batch_size(config.embedding.batch_size),
        ResponseParser::new(llm).with_max_tokens(config.llm.max_tokens),
        dimension,
    );

    tracing::info!(
        embedding_model = %embedding_model,
        llm_model = %llm_model,
        dimension = engine.dimension(),
        "Capabilities ready"
    );

    let chunks = ingest::load_chunks(&cli.chunks_dir).await?;
    run_pipeline(&engine, &input, &chunks, &config).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "pipeline",
            "--input",
            "input.json",
            "--top-k",
            "3",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.input, PathBuf::from("input.json"));
        assert_eq!(cli.top_k, Some(3));
        assert!(matches!(cli.log_format, LogFormat::Json));
    }
}
