//! Stats command handler.
//!
//! Prints size and coverage statistics for a chunk file.

use clap::Args;
use lexrag_core::{config::AppConfig, AppResult};
use lexrag_corpus::{Chunk, CorpusStats};
use std::path::PathBuf;

use super::{artifact_path, read_json, CHUNKS_FILE};

/// Show statistics for a chunk file
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Input chunk file (default: chunks.json in the workspace)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let input = artifact_path(config, self.input.as_deref(), CHUNKS_FILE);
        let chunks: Vec<Chunk> = read_json(&input)?;
        let stats = CorpusStats::compute(&chunks);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Chunk file: {}", input.display());
            println!("  chunks:        {}", stats.total_chunks);
            println!("  laws:          {}", stats.unique_laws);
            println!("  avg chars:     {}", stats.avg_chars);
            println!("  median chars:  {}", stats.median_chars);
            println!("  min / max:     {} / {}", stats.min_chars, stats.max_chars);
            println!("  oversized:     {}", stats.oversized);
            println!("  undersized:    {}", stats.undersized);
        }

        Ok(())
    }
}
