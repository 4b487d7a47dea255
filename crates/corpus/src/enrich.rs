//! Chunk enrichment through the completion capability.
//!
//! Each chunk gets a structured annotation (summary, keywords, questions)
//! from a remote model. Requests run under a bounded concurrency budget
//! against a rate-limited service; progress is checkpointed after every
//! batch so an interrupted run resumes where it left off. Per-chunk
//! failures never abort the batch: after retries are exhausted the chunk is
//! annotated with empty fields and counted in the run summary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::sleep;

use lexrag_core::AppResult;
use lexrag_llm::{extract_json_object, is_rate_limited, CompletionClient};

use crate::checkpoint::CheckpointStore;
use crate::normalize::truncate_chars;
use crate::types::{Chunk, ChunkAnnotation, EnrichSummary, EnrichedChunk};

/// Persisted enrichment progress: chunk index (as a string key) to its
/// completed annotation.
pub type EnrichProgress = HashMap<String, ChunkAnnotation>;

/// System prompt. The model is told to answer with bare JSON; it does not
/// always comply, hence the defensive parsing downstream.
const SYSTEM_PROMPT: &str = "Eres un experto en legislación laboral y de Seguridad Social española.\nResponde SIEMPRE con JSON válido, sin texto adicional ni bloques de código markdown.";

/// Tuning knobs for an enrichment run.
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Concurrent in-flight requests
    pub concurrency: usize,

    /// Attempts per chunk before degrading to an empty annotation
    pub max_retries: u32,

    /// Checkpoint after this many chunks
    pub save_every: usize,

    /// Prompt carries at most this many chars of chunk text
    pub max_text_chars: usize,

    /// Chunks shorter than this get a fixed annotation without a call
    pub min_text_chars: usize,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_retries: 3,
            save_every: 50,
            max_text_chars: 2000,
            min_text_chars: 60,
        }
    }
}

/// Build the user prompt for one chunk.
fn build_prompt(chunk: &Chunk, max_text_chars: usize) -> String {
    let text = truncate_chars(&chunk.text, max_text_chars);
    format!(
        "Analiza este fragmento de legislación y devuelve un JSON con:\n\
         1. \"resumen\": Resumen de 1-2 frases en español llano explicando qué regula.\n\
         2. \"palabras_clave\": Lista de 5-8 conceptos clave para búsqueda semántica.\n\
         3. \"preguntas\": Lista de 3-4 preguntas que este artículo respondería, formuladas como las haría un ciudadano o profesional de RRHH.\n\
         \n\
         LEY: {}\n\
         CAPÍTULO: {}\n\
         SECCIÓN: {}\n\
         \n\
         TEXTO:\n{}\n\
         \n\
         Responde SOLO con JSON válido.",
        chunk.law, chunk.chapter, chunk.section, text
    )
}

/// Parse a model response into an annotation.
///
/// The response must be (or contain) a JSON object with a `resumen` key;
/// anything else is treated as malformed.
fn parse_annotation(content: &str) -> Option<ChunkAnnotation> {
    let value = extract_json_object(content)?;
    if value.get("resumen").is_none() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Enrich one chunk with retries. Infallible by design: exhausted retries
/// yield the empty annotation.
async fn enrich_one(
    client: Arc<dyn CompletionClient>,
    chunk: Chunk,
    idx: usize,
    semaphore: Arc<Semaphore>,
    options: EnrichOptions,
) -> (usize, ChunkAnnotation) {
    // Derogated or vestigial articles carry no content worth a model call
    if chunk.text.chars().count() < options.min_text_chars {
        return (idx, ChunkAnnotation::derogated());
    }

    let _permit = semaphore
        .acquire()
        .await
        .expect("enrichment semaphore closed");

    for attempt in 0..options.max_retries {
        match client
            .complete(SYSTEM_PROMPT, &build_prompt(&chunk, options.max_text_chars))
            .await
        {
            Ok(content) => {
                if let Some(annotation) = parse_annotation(&content) {
                    return (idx, annotation);
                }
                tracing::debug!(idx, attempt, "malformed annotation response");
                sleep(Duration::from_secs(2)).await;
            }
            Err(err) if is_rate_limited(&err) => {
                let wait = Duration::from_secs(15 * u64::from(attempt + 1));
                tracing::warn!(idx, wait_secs = wait.as_secs(), "rate limited, backing off");
                sleep(wait).await;
            }
            Err(err) => {
                tracing::warn!(idx, error = %err, "enrichment request failed");
                sleep(Duration::from_secs(5)).await;
            }
        }
    }

    (idx, ChunkAnnotation::default())
}

/// Enrich a chunk set, resuming from the checkpoint when present.
///
/// Results are keyed by original chunk index; completion order between
/// chunks is unconstrained and the output is reassembled by index at the
/// end.
pub async fn enrich_chunks(
    client: Arc<dyn CompletionClient>,
    chunks: &[Chunk],
    checkpoint: &dyn CheckpointStore<EnrichProgress>,
    options: &EnrichOptions,
) -> AppResult<(Vec<EnrichedChunk>, EnrichSummary)> {
    let mut progress: EnrichProgress = checkpoint.load().await?.unwrap_or_default();
    let resumed = progress.len() as u32;

    let todo: Vec<(usize, Chunk)> = chunks
        .iter()
        .enumerate()
        .filter(|(i, _)| !progress.contains_key(&i.to_string()))
        .map(|(i, c)| (i, c.clone()))
        .collect();

    tracing::info!(
        total = chunks.len(),
        resumed,
        remaining = todo.len(),
        "starting enrichment"
    );

    let semaphore = Arc::new(Semaphore::new(options.concurrency));
    let mut summary = EnrichSummary {
        resumed,
        ..Default::default()
    };

    for batch in todo.chunks(options.save_every) {
        let tasks: Vec<_> = batch
            .iter()
            .map(|(idx, chunk)| {
                tokio::spawn(enrich_one(
                    Arc::clone(&client),
                    chunk.clone(),
                    *idx,
                    Arc::clone(&semaphore),
                    options.clone(),
                ))
            })
            .collect();

        for joined in join_all(tasks).await {
            let (idx, annotation) = joined
                .map_err(|e| lexrag_core::AppError::Other(format!("enrichment task: {}", e)))?;
            if annotation.is_populated() {
                summary.enriched += 1;
            } else {
                summary.failed += 1;
            }
            progress.insert(idx.to_string(), annotation);
        }

        checkpoint.save(&progress).await?;
        tracing::info!(
            done = progress.len(),
            total = chunks.len(),
            ok = summary.enriched,
            err = summary.failed,
            "enrichment batch checkpointed"
        );
    }

    // Reassemble in original chunk order
    let enriched = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| EnrichedChunk {
            chunk: chunk.clone(),
            annotation: progress.get(&i.to_string()).cloned().unwrap_or_default(),
        })
        .collect();

    tracing::info!(
        enriched = summary.enriched,
        failed = summary.failed,
        "enrichment complete"
    );

    Ok((enriched, summary))
}
