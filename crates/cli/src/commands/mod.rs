//! Command handlers for the Lexrag CLI.
//!
//! One submodule per pipeline stage, plus shared artifact-file helpers.

pub mod enrich;
pub mod extract;
pub mod stats;
pub mod upload;

// Re-export command types for convenience
pub use enrich::EnrichCommand;
pub use extract::ExtractCommand;
pub use stats::StatsCommand;
pub use upload::UploadCommand;

use lexrag_core::{config::AppConfig, AppResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default artifact file names within the workspace.
pub const CHUNKS_FILE: &str = "chunks.json";
pub const ENRICHED_FILE: &str = "enriched.json";
pub const ENRICH_PROGRESS_FILE: &str = "enrich_progress.json";
pub const UPLOAD_PROGRESS_FILE: &str = "uploaded_ids.json";

/// Resolve an artifact path: explicit flag wins, otherwise the default name
/// under the workspace.
pub fn artifact_path(config: &AppConfig, explicit: Option<&Path>, default_name: &str) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => config.workspace.join(default_name),
    }
}

/// Read a JSON artifact file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        lexrag_core::AppError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write a JSON artifact file, pretty-printed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path, contents)?;
    Ok(())
}
