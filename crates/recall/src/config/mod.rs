use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RecallError, Result};

/// Main configuration structure for Recall
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Memory store location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Reasoning oracle (chat completion API) configuration
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Knowledge sources available for retrieval, in registration order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecallError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a TOML config string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RecallError::Config(format!("Failed to parse config: {e}")))
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for all storage data
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// File name of the memory document inside `data_dir`
    #[serde(default = "default_memory_file")]
    pub memory_file: String,
}

impl StorageConfig {
    /// Full path of the persisted memory document
    pub fn memory_path(&self) -> PathBuf {
        self.data_dir.join(&self.memory_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            memory_file: default_memory_file(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".recall"))
        .unwrap_or_else(|| PathBuf::from(".recall"))
}

fn default_memory_file() -> String {
    "memory_store.json".to_string()
}

/// Remote oracle configuration (any OpenAI-compatible endpoint)
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// API base URL; `/chat/completions` is appended
    #[serde(default = "default_oracle_api_url")]
    pub api_url: String,
    /// Environment variable name for API key
    #[serde(default = "default_oracle_api_key_env")]
    pub api_key_env: String,
    /// Model identifier
    #[serde(default = "default_oracle_model")]
    pub model: String,
    /// Per-call timeout in seconds
    #[serde(default = "default_oracle_timeout_secs")]
    pub timeout_secs: u64,
    /// Sampling temperature (provider default when unset)
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Completion token limit (provider default when unset)
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_url: default_oracle_api_url(),
            api_key_env: default_oracle_api_key_env(),
            model: default_oracle_model(),
            timeout_secs: default_oracle_timeout_secs(),
            temperature: None,
            max_tokens: None,
        }
    }
}

fn default_oracle_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_oracle_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_oracle_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_oracle_timeout_secs() -> u64 {
    60
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// User identifier used when a query carries none
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
    /// Characters of the query kept in the episodic record content
    #[serde(default = "default_query_preview_chars")]
    pub query_preview_chars: usize,
    /// Ask the oracle which sources to consult. When off, every registered
    /// source is queried for every query without a routing call.
    #[serde(default = "default_route_queries")]
    pub route_queries: bool,
    /// Ask the oracle to validate retrieved items before use
    #[serde(default = "default_validate_retrieval")]
    pub validate_retrieval: bool,
    /// Per-source lookup timeout in seconds
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
    /// Attach the memory store to the pipeline
    #[serde(default = "default_memory_enabled")]
    pub memory_enabled: bool,
}

impl PipelineConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
            query_preview_chars: default_query_preview_chars(),
            route_queries: default_route_queries(),
            validate_retrieval: default_validate_retrieval(),
            source_timeout_secs: default_source_timeout_secs(),
            memory_enabled: default_memory_enabled(),
        }
    }
}

fn default_user_id() -> String {
    "user_001".to_string()
}

fn default_query_preview_chars() -> usize {
    100
}

fn default_route_queries() -> bool {
    true
}

fn default_validate_retrieval() -> bool {
    true
}

fn default_source_timeout_secs() -> u64 {
    30
}

fn default_memory_enabled() -> bool {
    true
}

/// A configured knowledge source
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Stable name the router refers to
    pub name: String,
    /// Lookup behaviour
    #[serde(default)]
    pub kind: SourceKind,
    /// Maximum items returned by a keyword source (unbounded when unset)
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Items served by this source
    #[serde(default)]
    pub items: Vec<SourceItemConfig>,
}

/// How a configured source answers a lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Every item, regardless of the query
    #[default]
    Static,
    /// Items sharing at least one query token
    Keyword,
}

/// A single configured source item
#[derive(Debug, Clone, Deserialize)]
pub struct SourceItemConfig {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
