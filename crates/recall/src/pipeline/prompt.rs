//! Answer prompt assembly
//!
//! Context blocks are tagged with where they came from: `[source] content` for
//! retrieved items and `[tier] content (from timestamp)` for memories. With no
//! context at all the prompt is the query itself.

use chrono::SecondsFormat;

use crate::memory::MemoryRecord;
use crate::sources::RetrievedItem;

/// Build the user prompt for the final answer
pub fn augmented_prompt(query: &str, items: &[RetrievedItem], memories: &[MemoryRecord]) -> String {
    if items.is_empty() && memories.is_empty() {
        return query.to_string();
    }

    let mut prompt = String::new();

    if !items.is_empty() {
        let context = items
            .iter()
            .map(|item| format!("[{}] {}", item.source_name, item.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        prompt.push_str(&format!("Context from multiple sources:\n{context}\n\n"));
    }

    if !memories.is_empty() {
        let context = memories
            .iter()
            .map(|m| {
                format!(
                    "[{}] {} (from {})",
                    m.tier,
                    m.content,
                    m.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str(&format!("Relevant memories:\n{context}\n\n"));
    }

    if items.is_empty() {
        prompt.push_str(&format!(
            "User query: {query}\n\nRespond naturally, incorporating relevant memories to personalize your response."
        ));
    } else if memories.is_empty() {
        prompt.push_str(&format!(
            "Question: {query}\n\nAnswer based on the context provided."
        ));
    } else {
        prompt.push_str(&format!(
            "Question: {query}\n\nAnswer based on the context provided, incorporating relevant memories to personalize your response."
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTier;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn item(source: &str, content: &str) -> RetrievedItem {
        RetrievedItem {
            content: content.to_string(),
            source_name: source.to_string(),
            source_metadata: BTreeMap::new(),
        }
    }

    fn memory(tier: MemoryTier, content: &str) -> MemoryRecord {
        MemoryRecord {
            id: 1,
            tier,
            content: content.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 11, 30, 9, 0, 0).unwrap(),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_no_context_is_bare_query() {
        assert_eq!(augmented_prompt("What is 2+2?", &[], &[]), "What is 2+2?");
    }

    #[test]
    fn test_source_context_blocks_are_tagged() {
        let prompt = augmented_prompt(
            "What's the latest AI news?",
            &[
                item("web_search", "GPT-5 announced"),
                item("database", "Machine learning enables systems to learn from data"),
            ],
            &[],
        );
        assert_eq!(
            prompt,
            "Context from multiple sources:\n[web_search] GPT-5 announced\n\n[database] Machine learning enables systems to learn from data\n\nQuestion: What's the latest AI news?\n\nAnswer based on the context provided."
        );
    }

    #[test]
    fn test_memory_context_blocks_carry_tier_and_time() {
        let prompt = augmented_prompt(
            "Can you remind me what I'm interested in?",
            &[],
            &[memory(MemoryTier::Procedural, "Interested in AI and machine learning")],
        );
        assert!(prompt.starts_with(
            "Relevant memories:\n[procedural] Interested in AI and machine learning (from 2025-11-30T09:00:00Z)\n\n"
        ));
        assert!(prompt.contains("User query: Can you remind me what I'm interested in?"));
    }

    #[test]
    fn test_both_context_kinds() {
        let prompt = augmented_prompt(
            "q",
            &[item("api", "Current weather: 72F, Sunny")],
            &[memory(MemoryTier::Semantic, "Lives in San Francisco")],
        );
        let sources_at = prompt.find("Context from multiple sources").unwrap();
        let memories_at = prompt.find("Relevant memories").unwrap();
        assert!(sources_at < memories_at);
        assert!(prompt.ends_with("incorporating relevant memories to personalize your response."));
    }
}
