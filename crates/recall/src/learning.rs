//! Learning extraction
//!
//! After an interaction, the oracle is asked which facts, preferences and
//! events are worth remembering. The reply is kept as text for logging and
//! inspection; it is not turned into memory records. The orchestrator writes
//! the episodic record for the interaction itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::MemoryTier;
use crate::oracle::{Oracle, OracleError, complete_within, prompts};

/// Raw extraction reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-tier suggestions parsed out of an extraction reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningCandidates {
    pub semantic: Vec<String>,
    pub procedural: Vec<String>,
    pub episodic: Vec<String>,
}

impl LearningCandidates {
    pub fn for_tier(&self, tier: MemoryTier) -> &[String] {
        match tier {
            MemoryTier::Episodic => &self.episodic,
            MemoryTier::Semantic => &self.semantic,
            MemoryTier::Procedural => &self.procedural,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.semantic.is_empty() && self.procedural.is_empty() && self.episodic.is_empty()
    }
}

impl ExtractionResult {
    /// Best-effort split of the `SEMANTIC:` / `PROCEDURAL:` / `EPISODIC:` lines.
    ///
    /// Each line's value may be bracketed; items are comma separated. Lines
    /// that carry no recognised label are ignored.
    pub fn candidates(&self) -> LearningCandidates {
        let mut candidates = LearningCandidates::default();
        for line in self.text.lines() {
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            let Ok(tier) = label.trim().trim_start_matches(['-', '*', ' ']).parse::<MemoryTier>()
            else {
                continue;
            };
            let items = split_items(value);
            match tier {
                MemoryTier::Episodic => candidates.episodic.extend(items),
                MemoryTier::Semantic => candidates.semantic.extend(items),
                MemoryTier::Procedural => candidates.procedural.extend(items),
            }
        }
        candidates
    }
}

fn split_items(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|item| item.trim().trim_matches('"').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct LearningExtractor {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl LearningExtractor {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// One oracle call over the conversation transcript
    pub async fn extract(&self, conversation: &str) -> Result<ExtractionResult, OracleError> {
        let prompt = prompts::extraction_prompt(conversation);
        let text = complete_within(
            self.oracle.as_ref(),
            self.timeout,
            prompts::EXTRACTION_SYSTEM,
            &prompt,
        )
        .await?;
        debug!("Extraction response: {}", text);

        Ok(ExtractionResult {
            text,
            timestamp: Utc::now(),
        })
    }
}
