//! Query pipeline: routing, retrieval, validation, answering and learning

pub mod orchestrator;
pub mod prompt;
pub mod trace;

pub use orchestrator::{Orchestrator, Query};
pub use prompt::augmented_prompt;
pub use trace::{PipelineStage, RunFailure, Trace};
