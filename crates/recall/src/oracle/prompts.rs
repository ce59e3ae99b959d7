//! Prompts sent to the reasoning oracle
//!
//! The decision prompts request a `KEY: value` line format. The oracle is not
//! guaranteed to follow it; see [`crate::decision::parser`] for how replies
//! are interpreted.

/// System prompt for the routing decision
pub const ROUTING_SYSTEM: &str =
    "You are a routing agent that decides if and where to retrieve information.";

/// Routing prompt
///
/// Placeholders: {sources} - comma-separated source names, {query} - the user query
pub const ROUTING_PROMPT: &str = r#"Analyze this query and decide:
1. Does it need external information retrieval? (yes/no)
2. If yes, which source(s): {sources}?
3. Why?

Query: {query}

Respond in this format:
NEEDS_RETRIEVAL: yes/no
SOURCES: [source1, source2, ...]
REASONING: explanation"#;

/// System prompt for the memory decision
pub const MEMORY_DECISION_SYSTEM: &str = "You are a memory management agent.";

/// Memory decision prompt
///
/// Placeholder: {query} - the user query
pub const MEMORY_DECISION_PROMPT: &str = r#"For this query, decide:
1. Should we search memory? (yes/no)
2. Which memory types to search? (episodic, semantic, procedural)
3. Will this interaction create new memories? (yes/no)

Query: {query}

Format:
SEARCH_MEMORY: yes/no
MEMORY_TYPES: [type1, type2, ...]
CREATE_MEMORY: yes/no
REASONING: explanation"#;

/// System prompt for result validation
pub const VALIDATION_SYSTEM: &str = "You are a validation agent that assesses result quality.";

/// Validation prompt
///
/// Placeholders: {query} - the user query, {results} - one `- content` line per item
pub const VALIDATION_PROMPT: &str = r#"Query: {query}

Retrieved results:
{results}

Are these results relevant and useful for answering the query?
Rate relevance (0-10) and explain why.

Format:
RELEVANCE_SCORE: X
EXPLANATION: ...
SHOULD_USE: yes/no"#;

/// System prompt for learning extraction
pub const EXTRACTION_SYSTEM: &str =
    "You are a memory extraction agent that identifies what to remember.";

/// Learning extraction prompt
///
/// Placeholder: {conversation} - the conversation text to analyze
pub const EXTRACTION_PROMPT: &str = r#"Analyze this conversation and extract:
1. Facts to remember (semantic memory)
2. User preferences or patterns (procedural memory)
3. Important events or context (episodic memory)

Conversation:
{conversation}

Format your response as:
SEMANTIC: [fact1, fact2, ...]
PROCEDURAL: [preference1, preference2, ...]
EPISODIC: [event1, event2, ...]"#;

/// System prompt for answering without memory
pub const ANSWER_SYSTEM: &str = "You are a helpful assistant.";

/// System prompt for answering when a memory store is attached
pub const ANSWER_WITH_MEMORY_SYSTEM: &str =
    "You are a helpful assistant with memory. Use past context to personalize responses.";

/// Build the routing prompt for a query and the known source names
pub fn routing_prompt(query: &str, sources: &[String]) -> String {
    ROUTING_PROMPT
        .replace("{sources}", &sources.join(", "))
        .replace("{query}", query)
}

/// Build the memory decision prompt for a query
pub fn memory_decision_prompt(query: &str) -> String {
    MEMORY_DECISION_PROMPT.replace("{query}", query)
}

/// Build the validation prompt from a query and already-rendered result lines
pub fn validation_prompt(query: &str, results: &str) -> String {
    VALIDATION_PROMPT
        .replace("{query}", query)
        .replace("{results}", results)
}

/// Build the learning extraction prompt for a conversation transcript
pub fn extraction_prompt(conversation: &str) -> String {
    EXTRACTION_PROMPT.replace("{conversation}", conversation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_prompt_lists_sources() {
        let prompt = routing_prompt(
            "What's new?",
            &["web_search".to_string(), "database".to_string()],
        );
        assert!(prompt.contains("which source(s): web_search, database?"));
        assert!(prompt.contains("Query: What's new?"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_validation_prompt_substitutes_results() {
        let prompt = validation_prompt("q", "- one\n- two");
        assert!(prompt.contains("Retrieved results:\n- one\n- two\n"));
    }

    #[test]
    fn test_extraction_prompt_embeds_conversation() {
        let prompt = extraction_prompt("User: hi\nAssistant: hello");
        assert!(prompt.contains("Conversation:\nUser: hi\nAssistant: hello\n"));
    }
}
