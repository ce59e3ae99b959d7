//! Recall - oracle-driven retrieval and tiered memory for LLM agents
//!
//! A query passes through a fixed pipeline: the reasoning oracle decides which
//! knowledge sources to consult, the sources are queried concurrently, the
//! oracle validates what came back, and the final answer is generated from
//! the accepted context. With a memory store attached, past interactions are
//! searched for context and every interaction is recorded as an episodic
//! memory.

pub mod config;
pub mod decision;
pub mod error;
pub mod learning;
pub mod memory;
pub mod oracle;
pub mod pipeline;
pub mod sources;
pub mod testing;
pub mod validator;

pub use error::RecallError;
