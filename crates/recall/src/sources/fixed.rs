//! In-process sources backed by a fixed item list

use async_trait::async_trait;

use crate::config::{SourceConfig, SourceKind};
use crate::memory::QueryTokens;
use crate::sources::{KnowledgeSource, SourceError, SourceItem};

/// Returns every item for any query
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    items: Vec<SourceItem>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, items: Vec<SourceItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

#[async_trait]
impl KnowledgeSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, _query: &str) -> Result<Vec<SourceItem>, SourceError> {
        Ok(self.items.clone())
    }
}

/// Returns items sharing a token with the query, in item order, up to `top_k`
#[derive(Debug, Clone)]
pub struct KeywordSource {
    name: String,
    items: Vec<SourceItem>,
    top_k: Option<usize>,
}

impl KeywordSource {
    pub fn new(name: impl Into<String>, items: Vec<SourceItem>, top_k: Option<usize>) -> Self {
        Self {
            name: name.into(),
            items,
            top_k,
        }
    }
}

#[async_trait]
impl KnowledgeSource for KeywordSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, query: &str) -> Result<Vec<SourceItem>, SourceError> {
        let tokens = QueryTokens::new(query);
        Ok(self
            .items
            .iter()
            .filter(|item| tokens.matches(&item.content))
            .take(self.top_k.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

/// Build a boxed source from its config entry
pub fn from_config(config: &SourceConfig) -> Box<dyn KnowledgeSource> {
    let items = config
        .items
        .iter()
        .map(|item| SourceItem {
            content: item.content.clone(),
            metadata: item.metadata.clone(),
        })
        .collect();

    match config.kind {
        SourceKind::Static => Box::new(StaticSource::new(&config.name, items)),
        SourceKind::Keyword => Box::new(KeywordSource::new(&config.name, items, config.top_k)),
    }
}
