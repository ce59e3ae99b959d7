//! Structured decisions produced from oracle text

use serde::{Deserialize, Serialize};

use crate::memory::MemoryTier;

/// Whether a query needs external knowledge, and from where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub needs_retrieval: bool,
    /// Source names in registration order; may be empty when nothing is registered
    pub sources: Vec<String>,
    /// The oracle's full reply
    pub rationale: String,
}

/// What the memory store should do for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDecision {
    pub search_memory: bool,
    /// Tiers in declaration order; never empty
    pub memory_types_to_search: Vec<MemoryTier>,
    pub create_memory: bool,
    /// The oracle's full reply
    pub rationale: String,
}

/// The oracle's judgement on retrieved items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Advisory relevance score in `0..=10`; 0 when the reply carries none
    pub relevance_score: u8,
    /// Only this flag gates whether items are kept
    pub accept: bool,
    /// The oracle's full reply
    pub rationale: String,
}
