//! Source registry and fan-out retrieval

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::sources::{KnowledgeSource, RetrievedItem, SourceError, SourceItem, fixed};

/// Default per-source lookup deadline
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// A dropped source contribution, kept for the trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source_name: String,
    pub message: String,
}

impl From<&SourceError> for SourceFailure {
    fn from(err: &SourceError) -> Self {
        Self {
            source_name: err.source_name().to_string(),
            message: err.to_string(),
        }
    }
}

/// Merged result of one retrieval
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    /// Items grouped by source in requested order, each source's order preserved
    pub items: Vec<RetrievedItem>,
    /// Requested names with no registered source
    pub unknown: Vec<String>,
    /// Sources whose lookup failed or timed out
    pub failures: Vec<SourceFailure>,
}

/// Named knowledge sources in registration order
#[derive(Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn KnowledgeSource>>,
    timeout: Duration,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    /// Build a registry from configured sources
    pub fn from_config(configs: &[SourceConfig], timeout: Duration) -> Self {
        let mut registry = Self::new().with_timeout(timeout);
        for config in configs {
            registry.register_arc(Arc::from(fixed::from_config(config)));
        }
        registry
    }

    /// Deadline applied to each individual lookup
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a source. A source with the same name is replaced in place.
    pub fn register(&mut self, source: impl KnowledgeSource + 'static) -> &mut Self {
        self.register_arc(Arc::new(source))
    }

    pub fn register_arc(&mut self, source: Arc<dyn KnowledgeSource>) -> &mut Self {
        match self.sources.iter().position(|s| s.name() == source.name()) {
            Some(pos) => {
                warn!(source = source.name(), "Replacing registered source");
                self.sources[pos] = source;
            }
            None => self.sources.push(source),
        }
        self
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn KnowledgeSource>> {
        self.sources.iter().find(|s| s.name() == name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Query the named sources concurrently and merge their items.
    ///
    /// Unknown names are skipped. A failing or slow source loses its
    /// contribution; the others are unaffected. Items are concatenated in the
    /// order of `names`, not in completion order, and are neither ranked nor
    /// deduplicated.
    pub async fn retrieve(&self, query: &str, names: &[String]) -> RetrievalOutcome {
        let mut outcome = RetrievalOutcome::default();

        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            match self.get(name) {
                Some(source) => selected.push(Arc::clone(source)),
                None => {
                    warn!(source = %name, "Unknown source, skipping");
                    outcome.unknown.push(name.clone());
                }
            }
        }

        let lookups = selected
            .iter()
            .map(|source| self.lookup_one(source.as_ref(), query));
        let results = join_all(lookups).await;

        for (source, result) in selected.iter().zip(results) {
            match result {
                Ok(items) => {
                    debug!(source = source.name(), items = items.len(), "Source lookup");
                    outcome.items.extend(
                        items
                            .into_iter()
                            .map(|item| RetrievedItem::from_source(source.name(), item)),
                    );
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Source lookup failed, dropping");
                    outcome.failures.push(SourceFailure::from(&e));
                }
            }
        }

        outcome
    }

    async fn lookup_one(
        &self,
        source: &dyn KnowledgeSource,
        query: &str,
    ) -> Result<Vec<SourceItem>, SourceError> {
        match tokio::time::timeout(self.timeout, source.lookup(query)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                source_name: source.name().to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticSource;

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = SourceRegistry::new();
        registry
            .register(StaticSource::new("a", vec![]))
            .register(StaticSource::new("b", vec![]))
            .register(StaticSource::new("a", vec![SourceItem::new("x")]));

        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_retrieve_with_no_names_is_empty() {
        let mut registry = SourceRegistry::new();
        registry.register(StaticSource::new("a", vec![SourceItem::new("x")]));

        let outcome = registry.retrieve("q", &[]).await;
        assert_eq!(outcome, RetrievalOutcome::default());
    }

    #[test]
    fn test_debug_lists_names() {
        let mut registry = SourceRegistry::new();
        registry.register(StaticSource::new("api", vec![]));
        assert!(format!("{registry:?}").contains("api"));
    }
}
