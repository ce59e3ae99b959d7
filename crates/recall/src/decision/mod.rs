//! Decision parsing
//!
//! Turns the oracle's free-text judgements into typed routing, memory and
//! validation decisions. Kept independent of the oracle call itself so the
//! grammar can change without touching the pipeline.

pub mod parser;
pub mod types;

pub use parser::{parse_memory_decision, parse_routing, parse_validation};
pub use types::{MemoryDecision, RoutingDecision, ValidationVerdict};
