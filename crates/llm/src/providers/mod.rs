//! Provider implementations for the completion and embedding capabilities.

pub mod azure;

pub use azure::AzureOpenAiClient;
