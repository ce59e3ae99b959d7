//! Per-run observability record

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decision::{MemoryDecision, RoutingDecision, ValidationVerdict};
use crate::error::RecallError;
use crate::learning::ExtractionResult;
use crate::memory::{MemoryRecord, MemoryStats};
use crate::sources::{RetrievalOutcome, RetrievedItem};

/// Pipeline states, in the order a run passes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Routing,
    Retrieving,
    Validating,
    Answering,
    Learning,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Routing => "routing",
            PipelineStage::Retrieving => "retrieving",
            PipelineStage::Validating => "validating",
            PipelineStage::Answering => "answering",
            PipelineStage::Learning => "learning",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything a run decided and produced.
///
/// On failure the trace holds whatever was computed before the error, with
/// `stage` set to the stage that failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub run_id: Uuid,
    pub query: String,
    pub user_id: String,
    pub stage: PipelineStage,
    pub routing: Option<RoutingDecision>,
    pub memory_decision: Option<MemoryDecision>,
    pub retrieval: Option<RetrievalOutcome>,
    pub validation: Option<ValidationVerdict>,
    /// Retrieved items passed to the answer prompt
    pub context: Vec<RetrievedItem>,
    /// Memories passed to the answer prompt
    pub memory_context: Vec<MemoryRecord>,
    /// Exact user prompt sent for the answer
    pub prompt: Option<String>,
    pub answer: Option<String>,
    pub extraction: Option<ExtractionResult>,
    pub new_memories: Vec<MemoryRecord>,
    pub memory_stats: Option<MemoryStats>,
}

impl Trace {
    pub fn new(query: &str, user_id: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            query: query.to_string(),
            user_id: user_id.to_string(),
            stage: PipelineStage::Routing,
            routing: None,
            memory_decision: None,
            retrieval: None,
            validation: None,
            context: Vec::new(),
            memory_context: Vec::new(),
            prompt: None,
            answer: None,
            extraction: None,
            new_memories: Vec::new(),
            memory_stats: None,
        }
    }

    /// Items returned by the sources before validation
    pub fn retrieved_items(&self) -> &[RetrievedItem] {
        self.retrieval
            .as_ref()
            .map(|r| r.items.as_slice())
            .unwrap_or_default()
    }
}

/// A fatal error together with the partial trace of the aborted run
#[derive(Debug, thiserror::Error)]
#[error("pipeline failed while {}: {error}", .trace.stage)]
pub struct RunFailure {
    #[source]
    pub error: RecallError,
    pub trace: Box<Trace>,
}
