//! Lexrag LLM Library
//!
//! Abstractions over the remote language-model capabilities the pipeline
//! depends on: chat completions (chunk enrichment) and embeddings (vector
//! indexing), plus defensive parsing of model output.

pub mod client;
pub mod parse;
pub mod providers;

pub use client::{is_rate_limited, CompletionClient, EmbeddingClient};
pub use parse::extract_json_object;
pub use providers::AzureOpenAiClient;
