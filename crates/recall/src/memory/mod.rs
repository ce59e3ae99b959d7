//! Memory types and operations
//!
//! Defines the tiered record store the orchestrator reads from and writes
//! to across pipeline runs.

pub mod search;
pub mod store;
pub mod types;

pub use search::{QueryTokens, token_overlap};
pub use store::MemoryStore;
pub use types::{MemoryRecord, MemoryStats, MemoryTier};
