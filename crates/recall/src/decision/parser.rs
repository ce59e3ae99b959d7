//! Oracle reply parsing
//!
//! Decision prompts ask for `KEY: value` lines, but the oracle does not always
//! comply. Parsing never fails on malformed text; missing fields fall back to
//! fixed defaults:
//!
//! | field               | rule                                   | default when missing |
//! |---------------------|----------------------------------------|----------------------|
//! | `NEEDS_RETRIEVAL`   | label line contains "yes"              | `false`              |
//! | `SEARCH_MEMORY`     | label line contains "yes"              | `false`              |
//! | `CREATE_MEMORY`     | label line contains "yes"              | `true`               |
//! | `SHOULD_USE`        | label line contains "yes"              | `true`               |
//! | sources             | known name appears anywhere in reply   | every known source   |
//! | memory types        | tier name appears anywhere in reply    | every tier           |
//! | `RELEVANCE_SCORE`   | first integer on the label line, `<=10`| `0`                  |
//!
//! Labels are matched ASCII case-insensitively; the "yes" test is
//! case-insensitive; name containment is literal.

use tracing::warn;

use crate::decision::types::{MemoryDecision, RoutingDecision, ValidationVerdict};
use crate::memory::MemoryTier;
use crate::oracle::OracleError;

pub const NEEDS_RETRIEVAL: &str = "NEEDS_RETRIEVAL:";
pub const SEARCH_MEMORY: &str = "SEARCH_MEMORY:";
pub const CREATE_MEMORY: &str = "CREATE_MEMORY:";
pub const SHOULD_USE: &str = "SHOULD_USE:";
pub const RELEVANCE_SCORE: &str = "RELEVANCE_SCORE:";

const MAX_RELEVANCE: u8 = 10;

/// Parse a routing reply against the registered source names.
pub fn parse_routing(text: &str, known_sources: &[String]) -> Result<RoutingDecision, OracleError> {
    let text = non_empty(text)?;

    let needs_retrieval = label_flag(text, NEEDS_RETRIEVAL).unwrap_or(false);
    let mut sources: Vec<String> = known_sources
        .iter()
        .filter(|name| text.contains(name.as_str()))
        .cloned()
        .collect();
    if sources.is_empty() {
        warn!("Routing reply names no known source, using all");
        sources = known_sources.to_vec();
    }

    Ok(RoutingDecision {
        needs_retrieval,
        sources,
        rationale: text.to_string(),
    })
}

/// Parse a memory decision reply.
pub fn parse_memory_decision(text: &str) -> Result<MemoryDecision, OracleError> {
    let text = non_empty(text)?;

    let mut tiers: Vec<MemoryTier> = MemoryTier::ALL
        .into_iter()
        .filter(|tier| text.contains(tier.as_str()))
        .collect();
    if tiers.is_empty() {
        warn!("Memory decision names no tier, searching all");
        tiers = MemoryTier::ALL.to_vec();
    }

    Ok(MemoryDecision {
        search_memory: label_flag(text, SEARCH_MEMORY).unwrap_or(false),
        memory_types_to_search: tiers,
        create_memory: label_flag(text, CREATE_MEMORY).unwrap_or(true),
        rationale: text.to_string(),
    })
}

/// Parse a validation reply.
pub fn parse_validation(text: &str) -> Result<ValidationVerdict, OracleError> {
    let text = non_empty(text)?;

    Ok(ValidationVerdict {
        relevance_score: relevance_score(text),
        accept: label_flag(text, SHOULD_USE).unwrap_or(true),
        rationale: text.to_string(),
    })
}

/// Value of a yes/no label, or `None` when the label is absent.
///
/// The value is the rest of the label's line; it counts as yes when it
/// contains "yes" in any case.
pub fn label_flag(text: &str, label: &str) -> Option<bool> {
    label_line(text, label).map(|value| value.to_lowercase().contains("yes"))
}

fn relevance_score(text: &str) -> u8 {
    let Some(value) = label_line(text, RELEVANCE_SCORE) else {
        return 0;
    };
    let Some(start) = value.find(|c: char| c.is_ascii_digit()) else {
        return 0;
    };
    if value[..start].trim_end().ends_with('-') {
        return 0;
    }
    value[start..]
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0u8, |score, digit| {
            score
                .saturating_mul(10)
                .saturating_add(digit as u8)
                .min(MAX_RELEVANCE)
        })
}

fn label_line<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let start = text
        .to_ascii_lowercase()
        .find(&label.to_ascii_lowercase())?
        + label.len();
    let rest = &text[start..];
    Some(rest.split('\n').next().unwrap_or(rest))
}

fn non_empty(text: &str) -> Result<&str, OracleError> {
    if text.trim().is_empty() {
        Err(OracleError::Protocol("empty decision text".to_string()))
    } else {
        Ok(text)
    }
}
