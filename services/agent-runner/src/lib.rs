//! Agent Runner Library
//!
//! Autonomous execution agent for the signals dashboard: matches ingested
//! signals against their action window and drives the execution target.

pub mod config;
pub mod matcher;
pub mod runner;
pub mod target;

// Re-export main types for convenience
pub use config::Config;
pub use matcher::{should_execute, ProcessedSet};
pub use runner::AgentRunner;
pub use target::{AttemptOutcome, ExecutionTarget, TargetClient};
