//! Pipeline state machine
//!
//! One run walks `Routing -> Retrieving -> Validating -> Answering -> Learning`
//! and stops at the first fatal error. Which stages execute depends on what is
//! attached: routing needs a non-empty registry, the memory decision and the
//! learning stage need a memory store. With `route_queries` off, every
//! registered source is queried without asking the oracle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::{Config, PipelineConfig};
use crate::decision::{parse_memory_decision, parse_routing};
use crate::error::Result;
use crate::learning::LearningExtractor;
use crate::memory::{MemoryStore, MemoryTier};
use crate::oracle::{Oracle, OracleError, complete_within, prompts};
use crate::pipeline::prompt::augmented_prompt;
use crate::pipeline::trace::{PipelineStage, RunFailure, Trace};
use crate::sources::SourceRegistry;
use crate::validator::Validator;

/// A query as issued by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub user_id: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_id: None,
        }
    }

    pub fn for_user(text: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_id: Some(user_id.into()),
        }
    }
}

pub struct Orchestrator {
    oracle: Arc<dyn Oracle>,
    registry: SourceRegistry,
    memory: Option<Arc<MemoryStore>>,
    validator: Validator,
    extractor: LearningExtractor,
    settings: PipelineConfig,
    oracle_timeout: Duration,
}

impl Orchestrator {
    pub fn new(oracle: Arc<dyn Oracle>, settings: PipelineConfig, oracle_timeout: Duration) -> Self {
        Self {
            validator: Validator::new(oracle.clone(), oracle_timeout),
            extractor: LearningExtractor::new(oracle.clone(), oracle_timeout),
            oracle,
            registry: SourceRegistry::new().with_timeout(settings.source_timeout()),
            memory: None,
            settings,
            oracle_timeout,
        }
    }

    /// Wire an orchestrator from a loaded config.
    ///
    /// Sources come from `[[sources]]`; the memory store is attached only
    /// when `pipeline.memory_enabled` is set.
    pub async fn from_config(config: &Config, oracle: Arc<dyn Oracle>) -> Result<Self> {
        let registry =
            SourceRegistry::from_config(&config.sources, config.pipeline.source_timeout());
        let mut orchestrator =
            Self::new(oracle, config.pipeline.clone(), config.oracle.timeout()).with_registry(registry);

        if config.pipeline.memory_enabled {
            let store = MemoryStore::load(config.storage.memory_path()).await?;
            orchestrator = orchestrator.with_memory(Arc::new(store));
        }

        Ok(orchestrator)
    }

    pub fn with_registry(mut self, registry: SourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_memory(mut self, store: Arc<MemoryStore>) -> Self {
        self.memory = Some(store);
        self
    }

    /// Run one query to completion.
    ///
    /// A fatal error comes back with the partial trace; its `stage` is the
    /// stage that failed.
    pub async fn run(&self, query: Query) -> std::result::Result<Trace, RunFailure> {
        let user_id = query
            .user_id
            .clone()
            .unwrap_or_else(|| self.settings.default_user_id.clone());
        let mut trace = Trace::new(&query.text, &user_id);

        let span = info_span!("pipeline", run_id = %trace.run_id, user_id = %user_id);
        let outcome = self.drive(&query.text, &user_id, &mut trace).instrument(span).await;

        match outcome {
            Ok(()) => {
                trace.stage = PipelineStage::Done;
                Ok(trace)
            }
            Err(error) => {
                warn!(run_id = %trace.run_id, stage = %trace.stage, "Pipeline aborted: {}", error);
                Err(RunFailure {
                    error,
                    trace: Box::new(trace),
                })
            }
        }
    }

    async fn drive(&self, query: &str, user_id: &str, trace: &mut Trace) -> Result<()> {
        info!(stage = "routing", "Query: {}", preview(query, self.settings.query_preview_chars));

        if !self.registry.is_empty() && self.settings.route_queries {
            let names = self.registry.names();
            let reply = self
                .ask(prompts::ROUTING_SYSTEM, &prompts::routing_prompt(query, &names))
                .await?;
            debug!("Routing response: {}", reply);
            let routing = parse_routing(&reply, &names)?;
            info!(
                needs_retrieval = routing.needs_retrieval,
                sources = ?routing.sources,
                "Routing decision"
            );
            trace.routing = Some(routing);
        }

        if self.memory.is_some() {
            let reply = self
                .ask(
                    prompts::MEMORY_DECISION_SYSTEM,
                    &prompts::memory_decision_prompt(query),
                )
                .await?;
            debug!("Memory decision response: {}", reply);
            let decision = parse_memory_decision(&reply)?;
            info!(
                search_memory = decision.search_memory,
                create_memory = decision.create_memory,
                "Memory decision"
            );
            trace.memory_decision = Some(decision);
        }

        let routed = if self.settings.route_queries {
            trace
                .routing
                .as_ref()
                .filter(|routing| routing.needs_retrieval)
                .map(|routing| routing.sources.clone())
        } else if self.registry.is_empty() {
            None
        } else {
            Some(self.registry.names())
        };

        if let Some(sources) = routed {
            trace.stage = PipelineStage::Retrieving;
            let outcome = self.registry.retrieve(query, &sources).await;
            info!(
                items = outcome.items.len(),
                failures = outcome.failures.len(),
                "Retrieved from {} source(s)",
                sources.len()
            );
            let items = outcome.items.clone();
            trace.retrieval = Some(outcome);

            if self.settings.validate_retrieval {
                trace.stage = PipelineStage::Validating;
                let validation = self.validator.validate(query, items).await?;
                trace.validation = Some(validation.verdict);
                trace.context = validation.kept;
            } else {
                trace.context = items;
            }
        }

        let memory_tiers = trace
            .memory_decision
            .as_ref()
            .filter(|decision| decision.search_memory)
            .map(|decision| decision.memory_types_to_search.clone());

        if let (Some(store), Some(tiers)) = (&self.memory, memory_tiers) {
            trace.stage = PipelineStage::Retrieving;
            trace.memory_context = store.search(query, &tiers).await;
            info!(memories = trace.memory_context.len(), "Memory search");
        }

        trace.stage = PipelineStage::Answering;
        let prompt = augmented_prompt(query, &trace.context, &trace.memory_context);
        let system = if self.memory.is_some() {
            prompts::ANSWER_WITH_MEMORY_SYSTEM
        } else {
            prompts::ANSWER_SYSTEM
        };
        trace.prompt = Some(prompt.clone());
        let answer = self.ask(system, &prompt).await?;
        trace.answer = Some(answer.clone());

        let Some(store) = &self.memory else {
            return Ok(());
        };

        let create_memory = trace
            .memory_decision
            .as_ref()
            .is_some_and(|decision| decision.create_memory);

        if create_memory {
            trace.stage = PipelineStage::Learning;
            let conversation = format!("User: {query}\nAssistant: {answer}");
            trace.extraction = Some(self.extractor.extract(&conversation).await?);

            let content = format!(
                "Conversation with {user_id}: {}...",
                preview(query, self.settings.query_preview_chars)
            );
            let metadata = BTreeMap::from([
                ("user_id".to_string(), user_id.to_string()),
                ("query".to_string(), query.to_string()),
            ]);
            let record = store.write(content, MemoryTier::Episodic, metadata).await?;
            info!(id = record.id, "Stored episodic memory");
            trace.new_memories.push(record);
        }

        trace.memory_stats = Some(store.stats().await);
        Ok(())
    }

    async fn ask(&self, system: &str, user: &str) -> std::result::Result<String, OracleError> {
        complete_within(self.oracle.as_ref(), self.oracle_timeout, system, user).await
    }
}

/// First `max_chars` characters, never splitting a code point
fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 4), "héll");
        assert_eq!(preview("short", 100), "short");
        assert_eq!(preview("", 3), "");
    }

    #[test]
    fn test_query_constructors() {
        assert_eq!(Query::new("hi").user_id, None);
        assert_eq!(Query::for_user("hi", "user_002").user_id.as_deref(), Some("user_002"));
    }
}
