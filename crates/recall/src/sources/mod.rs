//! Knowledge sources
//!
//! A knowledge source is a named, independently pluggable lookup: given a
//! query it returns zero or more items with arbitrary string metadata. The
//! [`SourceRegistry`] fans a query out to the routed sources and merges the
//! results in a deterministic order.

pub mod fixed;
pub mod registry;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use fixed::{KeywordSource, StaticSource};
pub use registry::{RetrievalOutcome, SourceFailure, SourceRegistry};

/// Raw item returned by a source lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl SourceItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add one metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Item tagged with the source it came from. Lives for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedItem {
    pub content: String,
    pub source_name: String,
    pub source_metadata: BTreeMap<String, String>,
}

impl RetrievedItem {
    pub fn from_source(source_name: &str, item: SourceItem) -> Self {
        Self {
            content: item.content,
            source_name: source_name.to_string(),
            source_metadata: item.metadata,
        }
    }
}

/// A single source's failure. Never fatal: the source's items are dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("Source '{source_name}' lookup failed: {message}")]
    Lookup { source_name: String, message: String },
    #[error("Source '{source_name}' timed out after {timeout:?}")]
    Timeout {
        source_name: String,
        timeout: Duration,
    },
}

impl SourceError {
    pub fn lookup(source_name: &str, message: impl Into<String>) -> Self {
        SourceError::Lookup {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn source_name(&self) -> &str {
        match self {
            SourceError::Lookup { source_name, .. } | SourceError::Timeout { source_name, .. } => {
                source_name
            }
        }
    }
}

/// Trait for knowledge sources (web search, database, API adapters, fixtures)
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Stable name the router refers to
    fn name(&self) -> &str;

    /// Look up items for a query. "No results" is an empty vector, not an error.
    async fn lookup(&self, query: &str) -> Result<Vec<SourceItem>, SourceError>;
}
