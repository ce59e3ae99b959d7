pub mod ask;
pub mod memory;
pub mod stats;

pub use ask::AskCommand;
pub use memory::MemoryCommand;
pub use stats::StatsCommand;
