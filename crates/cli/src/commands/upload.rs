//! Upload command handler.
//!
//! Runs the indexing stage: embeds enriched chunks and upserts them into
//! the search index. Both credentials must be present before any work
//! starts.

use clap::Args;
use lexrag_core::{config::AppConfig, AppResult};
use lexrag_corpus::index::index_chunks;
use lexrag_corpus::{
    AzureSearchStore, EnrichedChunk, FileCheckpoint, IndexOptions, UploadProgress,
};
use lexrag_llm::AzureOpenAiClient;
use std::path::PathBuf;
use std::sync::Arc;

use super::{artifact_path, read_json, ENRICHED_FILE, UPLOAD_PROGRESS_FILE};

/// Embed enriched chunks and upload them to the search index
#[derive(Args, Debug)]
pub struct UploadCommand {
    /// Input enriched-chunk file (default: enriched.json in the workspace)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Progress file for resuming interrupted runs (default: uploaded_ids.json)
    #[arg(long)]
    pub progress: Option<PathBuf>,

    /// Target index name (overrides config)
    #[arg(long)]
    pub index: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl UploadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        // Fail before any work if either credential is missing
        let openai_key = config.resolve_openai_key()?;
        let search_key = config.resolve_search_key()?;

        let input = artifact_path(config, self.input.as_deref(), ENRICHED_FILE);
        let chunks: Vec<EnrichedChunk> = read_json(&input)?;
        tracing::info!("Loaded {} enriched chunks from {:?}", chunks.len(), input);

        let embedder = Arc::new(AzureOpenAiClient::new(
            &config.openai.endpoint,
            openai_key,
            &config.openai.api_version,
            &config.openai.completion_deployment,
            &config.openai.embedding_deployment,
        ));

        let index = self.index.as_deref().unwrap_or(&config.search.index);
        let store = Arc::new(AzureSearchStore::new(
            &config.search.endpoint,
            search_key,
            index,
        ));

        let progress_path = artifact_path(config, self.progress.as_deref(), UPLOAD_PROGRESS_FILE);
        let checkpoint: FileCheckpoint<UploadProgress> = FileCheckpoint::new(&progress_path);

        let summary = index_chunks(
            embedder,
            store,
            &chunks,
            &checkpoint,
            &IndexOptions::default(),
        )
        .await?;

        if self.json {
            let out = serde_json::json!({
                "index": index,
                "uploaded": summary.uploaded,
                "failed": summary.failed,
                "skipped": summary.skipped,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!(
                "Uploaded {} documents to index '{}' ({} failed, {} already uploaded)",
                summary.uploaded, index, summary.failed, summary.skipped
            );
        }

        Ok(())
    }
}
