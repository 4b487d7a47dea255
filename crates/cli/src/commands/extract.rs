//! Extract command handler.
//!
//! Runs the extraction stage: document dump in, chunk file out.

use clap::Args;
use lexrag_core::{config::AppConfig, AppResult};
use lexrag_corpus::{extract_corpus, JsonDocumentSource};
use std::path::PathBuf;

use super::{artifact_path, write_json, CHUNKS_FILE};

/// Extract chunks from a document dump
#[derive(Args, Debug)]
pub struct ExtractCommand {
    /// Path to the document dump (outline + page text, JSON)
    pub source: PathBuf,

    /// Output chunk file (default: chunks.json in the workspace)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExtractCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing extract command for {:?}", self.source);

        let source = JsonDocumentSource::from_path(&self.source)?;
        let output = extract_corpus(&source)?;

        let chunks_path = artifact_path(config, self.output.as_deref(), CHUNKS_FILE);
        write_json(&chunks_path, &output.chunks)?;

        if self.json {
            let summary = serde_json::json!({
                "output": chunks_path,
                "chunks": output.stats.total_chunks,
                "laws": output.stats.unique_laws,
                "matched": output.report.matched,
                "unmatched": output.report.unmatched,
                "matchRate": output.report.match_rate(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!(
                "Extracted {} chunks from {} laws into {}",
                output.stats.total_chunks,
                output.stats.unique_laws,
                chunks_path.display()
            );
            println!(
                "Chapter match rate: {:.1}% ({} matched, {} unmatched)",
                output.report.match_rate() * 100.0,
                output.report.matched,
                output.report.unmatched
            );
            for example in &output.report.examples {
                println!("  unmatched: {}", example);
            }
        }

        Ok(())
    }
}
