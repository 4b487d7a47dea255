//! Client abstractions for the completion and embedding capabilities.
//!
//! The ingestion pipeline consumes these as opaque capabilities: a
//! `complete(system, user) -> text` call for enrichment and a batched
//! `embed_batch(texts) -> vectors` call for indexing. Providers live in
//! [`crate::providers`].

use lexrag_core::{AppError, AppResult};

/// Trait for chat-completion providers.
///
/// Implementations are remote and rate-limited; callers own retry policy.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Get the provider name (e.g., "azure-openai").
    fn provider_name(&self) -> &str;

    /// Perform a single non-streaming completion.
    ///
    /// # Arguments
    /// * `system_prompt` - System role content
    /// * `user_prompt` - User role content
    ///
    /// # Returns
    /// The raw text of the first choice. May be malformed JSON, fenced
    /// markdown, or empty; callers must parse defensively.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> AppResult<String>;
}

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Get the model identifier.
    fn model_name(&self) -> &str;

    /// Get the embedding vector dimension.
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// The returned vectors are in input order, one per text.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;
}

/// Check whether an error is a rate-limiting response from the provider.
///
/// Rate-limited requests get a longer, escalating backoff than generic
/// transient failures.
pub fn is_rate_limited(err: &AppError) -> bool {
    matches!(err, AppError::Llm(msg) if msg.contains("429"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        let err = AppError::Llm("API error (429 Too Many Requests): slow down".to_string());
        assert!(is_rate_limited(&err));

        let err = AppError::Llm("API error (500): boom".to_string());
        assert!(!is_rate_limited(&err));

        let err = AppError::Config("missing key".to_string());
        assert!(!is_rate_limited(&err));
    }
}
