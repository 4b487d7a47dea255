//! Configuration management for the lexrag CLI.
//!
//! Configuration is loaded from multiple sources, later sources winning:
//! built-in defaults, an optional YAML file (`lexrag.yaml` in the workspace),
//! environment variables, and command-line flags.
//!
//! Credentials are never stored in the config file. The file names the
//! environment variable that holds each key (`apiKeyEnv`), and resolution
//! happens at validation time. A missing credential for the operation being
//! run is a fatal startup error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root: chunk files and progress files live here
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Completion/embedding provider settings
    pub openai: OpenAiConfig,

    /// Search store settings
    pub search: SearchConfig,
}

/// Azure OpenAI provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Service endpoint URL
    pub endpoint: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: String,

    /// Deployment used for chunk enrichment
    #[serde(rename = "completionDeployment")]
    pub completion_deployment: String,

    /// Deployment used for embeddings
    #[serde(rename = "embeddingDeployment")]
    pub embedding_deployment: String,

    /// API version query parameter
    #[serde(rename = "apiVersion")]
    pub api_version: String,
}

/// Azure AI Search store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Service endpoint URL
    pub endpoint: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: String,

    /// Target index name
    pub index: String,
}

/// Config file structure (all sections optional).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    openai: Option<OpenAiConfig>,
    search: Option<SearchConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openai-reader.cognitiveservices.azure.com".to_string(),
            api_key_env: "AZURE_OPENAI_READER_KEY".to_string(),
            completion_deployment: "gpt-5-nano".to_string(),
            embedding_deployment: "text-embedding-3-small".to_string(),
            api_version: "2024-12-01-preview".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ai-search.search.windows.net".to_string(),
            api_key_env: "AZURE_SEARCH_KEY".to_string(),
            index: "normativa".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            openai: OpenAiConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `LEXRAG_WORKSPACE`: Override workspace path
    /// - `LEXRAG_CONFIG`: Path to config file
    /// - `AZURE_OPENAI_READER_ENDPOINT`: Completion/embedding endpoint
    /// - `AZURE_SEARCH_ENDPOINT`: Search store endpoint
    /// - `AZURE_SEARCH_INDEX`: Search index name
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("LEXRAG_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("LEXRAG_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join("lexrag.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(endpoint) = std::env::var("AZURE_OPENAI_READER_ENDPOINT") {
            config.openai.endpoint = endpoint;
        }
        if let Ok(endpoint) = std::env::var("AZURE_SEARCH_ENDPOINT") {
            config.search.endpoint = endpoint;
        }
        if let Ok(index) = std::env::var("AZURE_SEARCH_INDEX") {
            config.search.index = index;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(openai) = config_file.openai {
            result.openai = openai;
        }

        if let Some(search) = config_file.search {
            result.search = search;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and config files.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve the OpenAI API key from its environment variable.
    ///
    /// Fatal when missing: enrichment and upload cannot proceed without it.
    pub fn resolve_openai_key(&self) -> AppResult<String> {
        std::env::var(&self.openai.api_key_env).map_err(|_| {
            AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.openai.api_key_env
            ))
        })
    }

    /// Resolve the search store API key from its environment variable.
    pub fn resolve_search_key(&self) -> AppResult<String> {
        std::env::var(&self.search.api_key_env).map_err(|_| {
            AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.search.api_key_env
            ))
        })
    }
}
