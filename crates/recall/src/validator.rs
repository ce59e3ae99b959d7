//! Retrieval validation
//!
//! Asks the oracle whether retrieved items are relevant to the query. Only the
//! explicit accept/reject answer gates the items; the relevance score is
//! advisory. A reply without an answer accepts everything.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::decision::{ValidationVerdict, parse_validation};
use crate::oracle::{Oracle, OracleError, complete_within, prompts};
use crate::sources::RetrievedItem;

/// Verdict plus the items that survive it
#[derive(Debug, Clone)]
pub struct Validation {
    pub verdict: ValidationVerdict,
    /// All input items if accepted, otherwise empty
    pub kept: Vec<RetrievedItem>,
}

pub struct Validator {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl Validator {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    pub async fn validate(
        &self,
        query: &str,
        items: Vec<RetrievedItem>,
    ) -> Result<Validation, OracleError> {
        let prompt = prompts::validation_prompt(query, &render_results(&items));
        let reply = complete_within(
            self.oracle.as_ref(),
            self.timeout,
            prompts::VALIDATION_SYSTEM,
            &prompt,
        )
        .await?;
        debug!("Validation response: {}", reply);

        let verdict = parse_validation(&reply)?;
        info!(
            accept = verdict.accept,
            relevance = verdict.relevance_score,
            items = items.len(),
            "Validation verdict"
        );

        let kept = if verdict.accept { items } else { Vec::new() };
        Ok(Validation { verdict, kept })
    }
}

fn render_results(items: &[RetrievedItem]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item.content))
        .collect::<Vec<_>>()
        .join("\n")
}
