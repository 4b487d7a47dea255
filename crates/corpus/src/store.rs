//! Search store abstraction and implementations.
//!
//! The vector index is consumed as an opaque upsert capability. Documents
//! use the merge-or-upload action, so re-sending an unchanged document
//! replaces it in place instead of duplicating it.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use lexrag_core::{AppError, AppResult};

/// A document as shipped to the search index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDocument {
    /// Upsert semantics; always `"mergeOrUpload"`
    #[serde(rename = "@search.action")]
    pub action: String,

    /// Deterministic identity derived from `(law, section)`
    pub id: String,

    pub law: String,
    pub chapter: String,
    pub section: String,
    pub text: String,
    pub resumen: String,
    pub palabras_clave: Vec<String>,

    /// Questions joined with newlines; the index treats this as one
    /// searchable field
    pub preguntas: String,

    pub text_vector: Vec<f32>,
}

/// Result of one upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub succeeded: u32,
    pub failed: u32,
}

/// Write-side interface to the search index.
#[async_trait::async_trait]
pub trait SearchStore: Send + Sync {
    /// Upsert a batch of documents, returning per-batch counts.
    ///
    /// Individual document rejections are reported in the outcome; a
    /// transport-level failure of the whole batch is an `Err`.
    async fn upsert(&self, documents: &[SearchDocument]) -> AppResult<UpsertOutcome>;
}

/// Azure AI Search upsert payload.
#[derive(Debug, Serialize)]
struct IndexBatch<'a> {
    value: &'a [SearchDocument],
}

/// Azure AI Search upsert response.
#[derive(Debug, Deserialize)]
struct IndexBatchResult {
    #[serde(default)]
    value: Vec<IndexItemResult>,
}

#[derive(Debug, Deserialize)]
struct IndexItemResult {
    #[serde(default)]
    status: bool,
}

/// Azure AI Search store client.
pub struct AzureSearchStore {
    endpoint: String,
    api_key: String,
    index: String,
    client: reqwest::Client,
}

impl AzureSearchStore {
    const API_VERSION: &'static str = "2024-07-01";

    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        index: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            index: index.into(),
            client: reqwest::Client::new(),
        }
    }

    fn docs_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/index?api-version={}",
            self.endpoint,
            self.index,
            Self::API_VERSION
        )
    }
}

#[async_trait::async_trait]
impl SearchStore for AzureSearchStore {
    async fn upsert(&self, documents: &[SearchDocument]) -> AppResult<UpsertOutcome> {
        let response = self
            .client
            .post(self.docs_url())
            .header("api-key", &self.api_key)
            .json(&IndexBatch { value: documents })
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to send upsert batch: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail: String = error_text.chars().take(300).collect();
            tracing::warn!(%status, "upsert batch rejected: {}", detail);
            return Ok(UpsertOutcome {
                succeeded: 0,
                failed: documents.len() as u32,
            });
        }

        let result: IndexBatchResult = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse upsert response: {}", e)))?;

        let succeeded = result.value.iter().filter(|r| r.status).count() as u32;
        let failed = result.value.iter().filter(|r| !r.status).count() as u32;

        Ok(UpsertOutcome { succeeded, failed })
    }
}

/// In-memory search store for tests. Keyed by document id, so upserting the
/// same identity twice keeps one record.
#[derive(Debug, Default)]
pub struct MemorySearchStore {
    docs: Mutex<HashMap<String, SearchDocument>>,
}

impl MemorySearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<SearchDocument> {
        self.docs.lock().expect("store lock poisoned").get(id).cloned()
    }
}

#[async_trait::async_trait]
impl SearchStore for MemorySearchStore {
    async fn upsert(&self, documents: &[SearchDocument]) -> AppResult<UpsertOutcome> {
        let mut docs = self.docs.lock().expect("store lock poisoned");
        for doc in documents {
            docs.insert(doc.id.clone(), doc.clone());
        }
        Ok(UpsertOutcome {
            succeeded: documents.len() as u32,
            failed: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> SearchDocument {
        SearchDocument {
            action: "mergeOrUpload".to_string(),
            id: id.to_string(),
            law: "Ley".to_string(),
            chapter: String::new(),
            section: "Artículo 1. X".to_string(),
            text: "texto".to_string(),
            resumen: String::new(),
            palabras_clave: Vec::new(),
            preguntas: String::new(),
            text_vector: vec![0.0; 4],
        }
    }

    #[test]
    fn test_document_serializes_search_action() {
        let json = serde_json::to_string(&doc("abc")).unwrap();
        assert!(json.contains(r#""@search.action":"mergeOrUpload""#));
    }

    #[test]
    fn test_docs_url() {
        let store = AzureSearchStore::new("https://s.search.windows.net/", "key", "normativa");
        assert_eq!(
            store.docs_url(),
            "https://s.search.windows.net/indexes/normativa/docs/index?api-version=2024-07-01"
        );
    }

    #[tokio::test]
    async fn test_memory_store_upsert_is_idempotent() {
        let store = MemorySearchStore::new();
        let batch = vec![doc("a"), doc("b")];

        let outcome = store.upsert(&batch).await.unwrap();
        assert_eq!(outcome.succeeded, 2);

        store.upsert(&batch).await.unwrap();
        assert_eq!(store.len(), 2);
    }
}
