//! Azure OpenAI provider implementation.
//!
//! One client serves both capabilities: chat completions (enrichment) and
//! embeddings (indexing). Deployments are addressed by name under a shared
//! endpoint, authenticated with an `api-key` header.

use crate::client::{CompletionClient, EmbeddingClient};
use lexrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding dimension of text-embedding-3-small.
const EMBEDDING_DIM: usize = 1536;

/// Completion token budget per enrichment request.
const MAX_COMPLETION_TOKENS: u32 = 4096;

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Chat completions response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Embeddings request body.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
}

/// Embeddings response body.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

/// Azure OpenAI client.
pub struct AzureOpenAiClient {
    /// Service endpoint, without trailing slash
    endpoint: String,

    /// API key sent in the `api-key` header
    api_key: String,

    /// API version query parameter
    api_version: String,

    /// Deployment name for chat completions
    completion_deployment: String,

    /// Deployment name for embeddings
    embedding_deployment: String,

    /// HTTP client
    client: reqwest::Client,
}

impl AzureOpenAiClient {
    /// Create a new Azure OpenAI client.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        completion_deployment: impl Into<String>,
        embedding_deployment: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            completion_deployment: completion_deployment.into(),
            embedding_deployment: embedding_deployment.into(),
            client: reqwest::Client::new(),
        }
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment, operation, self.api_version
        )
    }

    /// Send a POST request and surface non-2xx responses as `AppError::Llm`.
    ///
    /// The HTTP status code is embedded in the message so callers can
    /// distinguish rate limiting (429) from other failures.
    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> AppResult<R> {
        let response = self
            .client
            .post(url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait::async_trait]
impl CompletionClient for AzureOpenAiClient {
    fn provider_name(&self) -> &str {
        "azure-openai"
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> AppResult<String> {
        tracing::debug!(
            deployment = %self.completion_deployment,
            "Sending completion request"
        );

        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt.to_string(),
                },
            ],
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        };

        let url = self.deployment_url(&self.completion_deployment, "chat/completions");
        let response: ChatResponse = self.post_json(&url, &request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content)
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for AzureOpenAiClient {
    fn model_name(&self) -> &str {
        &self.embedding_deployment
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        tracing::debug!(
            deployment = %self.embedding_deployment,
            count = texts.len(),
            "Sending embeddings request"
        );

        let request = EmbeddingsRequest { input: texts };
        let url = self.deployment_url(&self.embedding_deployment, "embeddings");
        let response: EmbeddingsResponse = self.post_json(&url, &request).await?;

        if response.data.len() != texts.len() {
            return Err(AppError::Llm(format!(
                "Embedding count mismatch: sent {}, received {}",
                texts.len(),
                response.data.len()
            )));
        }

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}
