//! Signal Engine
//!
//! Signal lifecycle and ingestion core for the signals dashboard:
//! single-flight polling of the upstream feed, pure time-derived
//! lifecycle states, and reconciliation of curated vs. self-reported
//! outcomes.

pub mod feed;
pub mod ingestor;
pub mod outcome;
pub mod status;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use feed::FeedClient;
pub use ingestor::{IngestEvent, IngestorConfig, PollOutcome, PollStats, SignalIngestor};
pub use outcome::{display_result, needs_self_report, self_report_open, DisplayResult};
pub use status::{entry_anchor, lifecycle_state, window_minutes, LifecycleState};
pub use store::StoreClient;
pub use types::{
    AgentStatus, Direction, EngineError, FeedReader, FetchBatch, Outcome, Result, Signal,
    SignalStore, UserOutcome, UserResult,
};
