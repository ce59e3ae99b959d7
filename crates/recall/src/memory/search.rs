//! Token-overlap matching
//!
//! A record matches a query when at least one whitespace-delimited token of
//! the lower-cased query is a substring of the lower-cased content. This is a
//! predicate, not a ranking: callers keep their own insertion order.

/// Pre-tokenised query, so a scan lower-cases the query once.
#[derive(Debug, Clone)]
pub struct QueryTokens {
    tokens: Vec<String>,
}

impl QueryTokens {
    pub fn new(query: &str) -> Self {
        Self {
            tokens: query
                .to_lowercase()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether any query token occurs inside `content`
    pub fn matches(&self, content: &str) -> bool {
        if self.tokens.is_empty() {
            return false;
        }
        let content = content.to_lowercase();
        self.tokens.iter().any(|token| content.contains(token.as_str()))
    }
}

/// One-off form of [`QueryTokens::matches`]
pub fn token_overlap(query: &str, content: &str) -> bool {
    QueryTokens::new(query).matches(content)
}
