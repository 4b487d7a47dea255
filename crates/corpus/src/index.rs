//! Vector indexing: embedding chunks and upserting them into the search
//! store.
//!
//! Embedding throughput is the bottleneck, so this stage is purely
//! sequential: small embedding batches with a fixed inter-batch delay for
//! rate-limit compliance, buffered into larger upload batches. Document
//! identities are deterministic hashes of `(law, section)`, which makes
//! re-ingestion an upsert instead of a duplicate, and the set of uploaded
//! identities is checkpointed so an interrupted run resumes without
//! re-embedding.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::time::sleep;

use lexrag_core::AppResult;
use lexrag_llm::EmbeddingClient;

use crate::checkpoint::CheckpointStore;
use crate::normalize::truncate_chars;
use crate::store::{SearchDocument, SearchStore};
use crate::types::{EnrichedChunk, IndexSummary};

/// Persisted upload progress: ids already accepted by the store.
pub type UploadProgress = Vec<String>;

/// Tuning knobs for an indexing run.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Texts per embedding request
    pub embed_batch_size: usize,

    /// Documents per upsert request
    pub upload_batch_size: usize,

    /// Pause between embedding batches
    pub embed_delay: Duration,

    /// Embedding input is capped at this many chars
    pub max_text_chars: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            embed_batch_size: 16,
            upload_batch_size: 100,
            embed_delay: Duration::from_millis(500),
            max_text_chars: 8000,
        }
    }
}

/// Deterministic document identity for one chunk.
///
/// Hashing `(law, section)` means re-ingesting an unchanged article maps to
/// the same record. The separator keeps `("a|b", "c")` and `("a", "b|c")`
/// distinct enough in practice; titles never contain `|`.
pub fn document_id(law: &str, section: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(law.as_bytes());
    hasher.update(b"|");
    hasher.update(section.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn to_document(id: String, chunk: &EnrichedChunk, vector: Vec<f32>) -> SearchDocument {
    SearchDocument {
        action: "mergeOrUpload".to_string(),
        id,
        law: chunk.chunk.law.clone(),
        chapter: chunk.chunk.chapter.clone(),
        section: chunk.chunk.section.clone(),
        text: chunk.chunk.text.clone(),
        resumen: chunk.annotation.resumen.clone(),
        palabras_clave: chunk.annotation.palabras_clave.clone(),
        preguntas: chunk.annotation.preguntas.join("\n"),
        text_vector: vector,
    }
}

/// Embed and upload a chunk set, resuming from the checkpoint when present.
///
/// Re-running over the same chunk set is idempotent: already-uploaded
/// identities are skipped, and identities that do reach the store upsert in
/// place.
pub async fn index_chunks(
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn SearchStore>,
    chunks: &[EnrichedChunk],
    checkpoint: &dyn CheckpointStore<UploadProgress>,
    options: &IndexOptions,
) -> AppResult<IndexSummary> {
    let mut uploaded: HashSet<String> = checkpoint
        .load()
        .await?
        .unwrap_or_default()
        .into_iter()
        .collect();

    let remaining: Vec<(String, &EnrichedChunk)> = chunks
        .iter()
        .map(|c| (document_id(&c.chunk.law, &c.chunk.section), c))
        .filter(|(id, _)| !uploaded.contains(id))
        .collect();

    let mut summary = IndexSummary {
        skipped: (chunks.len() - remaining.len()) as u32,
        ..Default::default()
    };

    tracing::info!(
        total = chunks.len(),
        already_uploaded = uploaded.len(),
        remaining = remaining.len(),
        model = embedder.model_name(),
        "starting indexing"
    );

    if remaining.is_empty() {
        return Ok(summary);
    }

    let mut buffer: Vec<(String, SearchDocument)> = Vec::new();
    let total_batches = remaining.len().div_ceil(options.embed_batch_size);

    for (batch_no, batch) in remaining.chunks(options.embed_batch_size).enumerate() {
        let texts: Vec<String> = batch
            .iter()
            .map(|(_, c)| truncate_chars(&c.chunk.text, options.max_text_chars).to_string())
            .collect();

        // One immediate retry on embedding failure; a batch that fails twice
        // is left for the next run
        let embeddings = match embedder.embed_batch(&texts).await {
            Ok(vectors) => vectors,
            Err(err) => {
                tracing::warn!(batch_no, error = %err, "embedding failed, retrying once");
                sleep(Duration::from_secs(5)).await;
                match embedder.embed_batch(&texts).await {
                    Ok(vectors) => vectors,
                    Err(err) => {
                        tracing::warn!(batch_no, error = %err, "embedding retry failed, skipping batch");
                        continue;
                    }
                }
            }
        };

        for ((id, chunk), vector) in batch.iter().zip(embeddings) {
            buffer.push((id.clone(), to_document(id.clone(), chunk, vector)));
        }

        if buffer.len() >= options.upload_batch_size {
            flush(&*store, &mut buffer, &mut uploaded, &mut summary, checkpoint).await?;
        }

        tracing::debug!(
            batch = batch_no + 1,
            of = total_batches,
            uploaded = summary.uploaded,
            failed = summary.failed,
            "embedding batch done"
        );

        sleep(options.embed_delay).await;
    }

    if !buffer.is_empty() {
        flush(&*store, &mut buffer, &mut uploaded, &mut summary, checkpoint).await?;
    }

    tracing::info!(
        uploaded = summary.uploaded,
        failed = summary.failed,
        skipped = summary.skipped,
        total_in_index = uploaded.len(),
        "indexing complete"
    );

    Ok(summary)
}

/// Push the buffered documents to the store and checkpoint the result.
async fn flush(
    store: &dyn SearchStore,
    buffer: &mut Vec<(String, SearchDocument)>,
    uploaded: &mut HashSet<String>,
    summary: &mut IndexSummary,
    checkpoint: &dyn CheckpointStore<UploadProgress>,
) -> AppResult<()> {
    let documents: Vec<SearchDocument> = buffer.iter().map(|(_, d)| d.clone()).collect();

    match store.upsert(&documents).await {
        Ok(outcome) => {
            summary.uploaded += outcome.succeeded;
            summary.failed += outcome.failed;
            for (id, _) in buffer.iter().take(outcome.succeeded as usize) {
                uploaded.insert(id.clone());
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, batch_size = documents.len(), "upsert batch failed");
            summary.failed += documents.len() as u32;
        }
    }

    buffer.clear();

    let progress: UploadProgress = uploaded.iter().cloned().collect();
    checkpoint.save(&progress).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpoint;
    use crate::store::MemorySearchStore;
    use crate::types::{Chunk, ChunkAnnotation};
    use lexrag_core::{AppError, AppResult};

    fn enriched(section: &str) -> EnrichedChunk {
        EnrichedChunk {
            chunk: Chunk {
                law: "Estatuto de los Trabajadores".to_string(),
                chapter: "TÍTULO I".to_string(),
                section: section.to_string(),
                text: "régimen jurídico aplicable al contrato de trabajo".to_string(),
                pages: None,
            },
            annotation: ChunkAnnotation {
                resumen: "Resumen.".to_string(),
                palabras_clave: vec!["contrato".to_string()],
                preguntas: vec!["¿Qué es?".to_string(), "¿A quién aplica?".to_string()],
            },
        }
    }

    /// Embedding fake producing constant vectors.
    struct FakeEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingClient for FakeEmbedder {
        fn model_name(&self) -> &str {
            "fake-embed"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3, 0.4]).collect())
        }
    }

    /// Embedding fake that always fails.
    struct FailingEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingClient for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing-embed"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Err(AppError::Llm("embedding backend down".to_string()))
        }
    }

    #[test]
    fn test_document_id_deterministic_and_distinct() {
        let a = document_id("Ley A", "Artículo 1. X");
        let b = document_id("Ley A", "Artículo 1. X");
        let c = document_id("Ley A", "Artículo 2. Y");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_uploads_all_chunks() {
        let store = Arc::new(MemorySearchStore::new());
        let checkpoint = MemoryCheckpoint::new();
        let chunks = vec![enriched("Artículo 1. X"), enriched("Artículo 2. Y")];

        let summary = index_chunks(
            Arc::new(FakeEmbedder),
            store.clone(),
            &chunks,
            &checkpoint,
            &IndexOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary.uploaded, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(store.len(), 2);

        let id = document_id("Estatuto de los Trabajadores", "Artículo 1. X");
        let doc = store.get(&id).unwrap();
        assert_eq!(doc.preguntas, "¿Qué es?\n¿A quién aplica?");
        assert_eq!(doc.text_vector.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_twice_is_idempotent() {
        let store = Arc::new(MemorySearchStore::new());
        let checkpoint = MemoryCheckpoint::new();
        let chunks = vec![enriched("Artículo 1. X"), enriched("Artículo 2. Y")];
        let options = IndexOptions::default();

        let first = index_chunks(
            Arc::new(FakeEmbedder),
            store.clone(),
            &chunks,
            &checkpoint,
            &options,
        )
        .await
        .unwrap();
        assert_eq!(first.uploaded, 2);

        let second = index_chunks(
            Arc::new(FakeEmbedder),
            store.clone(),
            &chunks,
            &checkpoint,
            &options,
        )
        .await
        .unwrap();

        assert_eq!(second.uploaded, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_embedding_batch_left_for_next_run() {
        let store = Arc::new(MemorySearchStore::new());
        let checkpoint = MemoryCheckpoint::new();
        let chunks = vec![enriched("Artículo 1. X")];

        let summary = index_chunks(
            Arc::new(FailingEmbedder),
            store.clone(),
            &chunks,
            &checkpoint,
            &IndexOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary.uploaded, 0);
        assert!(store.is_empty());
        // Not marked uploaded: the chunk will be retried on the next run
        let progress: Option<UploadProgress> = checkpoint.load().await.unwrap();
        assert!(progress.unwrap_or_default().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_upload_batches_flush_at_threshold() {
        let store = Arc::new(MemorySearchStore::new());
        let checkpoint = MemoryCheckpoint::new();
        let chunks: Vec<EnrichedChunk> = (0..5)
            .map(|i| enriched(&format!("Artículo {}. X", i)))
            .collect();

        let options = IndexOptions {
            embed_batch_size: 2,
            upload_batch_size: 3,
            embed_delay: Duration::from_millis(1),
            max_text_chars: 8000,
        };

        let summary = index_chunks(
            Arc::new(FakeEmbedder),
            store.clone(),
            &chunks,
            &checkpoint,
            &options,
        )
        .await
        .unwrap();

        assert_eq!(summary.uploaded, 5);
        assert_eq!(store.len(), 5);
    }
}
