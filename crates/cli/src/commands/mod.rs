//! Command handlers for the Quorum CLI.

mod ask;
mod ingest;
mod stats;

pub use ask::AskCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;
