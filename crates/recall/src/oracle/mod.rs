//! Reasoning oracle abstraction
//!
//! The oracle is the external text-completion service consulted for routing,
//! validation, answer generation and learning extraction. Everything in the
//! crate talks to it through the [`Oracle`] trait and [`complete_within`].

pub mod prompts;
pub mod remote;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

pub use remote::RemoteOracle;

/// Oracle failures. Every variant aborts the pipeline run that hit it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// Empty or undecodable response text
    #[error("Oracle protocol error: {0}")]
    Protocol(String),
    /// Network or HTTP failure
    #[error("Oracle transport error: {0}")]
    Transport(String),
    /// No response within the configured deadline
    #[error("Oracle timed out after {0:?}")]
    Timeout(Duration),
}

/// Trait for text-completion backends (remote API, scripted test double, ...)
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Complete a single system + user prompt pair, returning the raw text.
    async fn complete(&self, system_prompt: &str, user_prompt: &str)
    -> Result<String, OracleError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Call the oracle with a deadline and reject empty replies.
///
/// Expiry maps to [`OracleError::Timeout`]; a reply that is empty or only
/// whitespace maps to [`OracleError::Protocol`].
pub async fn complete_within(
    oracle: &dyn Oracle,
    timeout: Duration,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String, OracleError> {
    let text = tokio::time::timeout(timeout, oracle.complete(system_prompt, user_prompt))
        .await
        .map_err(|_| OracleError::Timeout(timeout))??;

    if text.trim().is_empty() {
        return Err(OracleError::Protocol("empty response".to_string()));
    }

    debug!(oracle = oracle.name(), chars = text.len(), "Oracle responded");
    Ok(text)
}
