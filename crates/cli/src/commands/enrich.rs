//! Enrich command handler.
//!
//! Runs the enrichment stage against extracted chunks. The API key must be
//! present in the environment before any work starts.

use clap::Args;
use lexrag_core::{config::AppConfig, AppResult};
use lexrag_corpus::enrich::enrich_chunks;
use lexrag_corpus::{Chunk, EnrichOptions, EnrichProgress, FileCheckpoint};
use lexrag_llm::AzureOpenAiClient;
use std::path::PathBuf;
use std::sync::Arc;

use super::{artifact_path, read_json, write_json, CHUNKS_FILE, ENRICHED_FILE, ENRICH_PROGRESS_FILE};

/// Enrich extracted chunks with summaries, keywords and questions
#[derive(Args, Debug)]
pub struct EnrichCommand {
    /// Input chunk file (default: chunks.json in the workspace)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file for enriched chunks (default: enriched.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Progress file for resuming interrupted runs (default: enrich_progress.json)
    #[arg(long)]
    pub progress: Option<PathBuf>,

    /// Concurrent in-flight requests
    #[arg(long, default_value = "5")]
    pub concurrency: usize,

    /// Checkpoint after this many chunks
    #[arg(long, default_value = "50")]
    pub save_every: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EnrichCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        // Fail before any work if the credential is missing
        let api_key = config.resolve_openai_key()?;

        let input = artifact_path(config, self.input.as_deref(), CHUNKS_FILE);
        let chunks: Vec<Chunk> = read_json(&input)?;
        tracing::info!("Loaded {} chunks from {:?}", chunks.len(), input);

        let client = Arc::new(AzureOpenAiClient::new(
            &config.openai.endpoint,
            api_key,
            &config.openai.api_version,
            &config.openai.completion_deployment,
            &config.openai.embedding_deployment,
        ));

        let progress_path = artifact_path(config, self.progress.as_deref(), ENRICH_PROGRESS_FILE);
        let checkpoint: FileCheckpoint<EnrichProgress> = FileCheckpoint::new(&progress_path);

        let options = EnrichOptions {
            concurrency: self.concurrency,
            save_every: self.save_every,
            ..Default::default()
        };

        let (enriched, summary) = enrich_chunks(client, &chunks, &checkpoint, &options).await?;

        let output = artifact_path(config, self.output.as_deref(), ENRICHED_FILE);
        write_json(&output, &enriched)?;

        if self.json {
            let out = serde_json::json!({
                "output": output,
                "enriched": summary.enriched,
                "failed": summary.failed,
                "resumed": summary.resumed,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!(
                "Enriched {} chunks ({} failed, {} resumed) into {}",
                summary.enriched,
                summary.failed,
                summary.resumed,
                output.display()
            );
        }

        Ok(())
    }
}
