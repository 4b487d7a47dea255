//! Error types for the lexrag ingestion pipeline.
//!
//! This module defines a unified error enum covering all error categories:
//! configuration, I/O, LLM providers, corpus processing, and the search store.

use thiserror::Error;

/// Unified error type for the lexrag pipeline.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Per-chunk failures during enrichment and upload are *not* errors. They
/// degrade to empty annotations or failed-document counts and are reported
/// in the run summary. Only configuration and connectivity failures at
/// startup are fatal.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing credentials, bad config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion/embedding provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Chunking and hierarchy-reconstruction errors
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Search store errors
    #[error("Search error: {0}")]
    Search(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
