use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingested trading call from the upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Opaque unique identifier assigned by the feed
    pub id: String,
    /// Instrument symbol, e.g. "EURUSD"
    pub asset: String,
    /// Trade direction
    pub direction: Direction,
    /// Duration encoding, e.g. "M15", "H4"
    pub timeframe: String,
    /// Declared time-of-day entry, kept as raw text because the feed
    /// occasionally emits garbage here; parsed lazily at resolution time
    pub entry_time: Option<String>,
    /// Ingestion timestamp; carries the date used to anchor `entry_time`
    pub received_at: DateTime<Utc>,
    /// Authoritative outcome set by an external curator; immutable once set
    pub official_result: Option<Outcome>,
    /// Set only by the execution agent, independent of `official_result`
    pub agent_status: Option<AgentStatus>,
}

/// Trade direction. Some feed sources say BUY/SELL, others CALL/PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[serde(alias = "CALL", alias = "buy", alias = "BUY")]
    Call,
    #[serde(alias = "PUT", alias = "sell", alias = "SELL")]
    Put,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Call => write!(f, "call"),
            Direction::Put => write!(f, "put"),
        }
    }
}

/// Curated authoritative outcome of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Win1,
    Win2,
    Loss,
}

/// Outcome of the execution agent's attempt on a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Executed,
    Failed,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Executed => write!(f, "executed"),
            AgentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Self-reported outcome submitted by an end user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserOutcome {
    Win,
    Loss,
}

/// A user's self-reported result for one signal.
///
/// The store enforces at most one row per `(signal_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResult {
    pub id: Uuid,
    pub signal_id: String,
    pub user_id: Uuid,
    pub result: UserOutcome,
    pub created_at: DateTime<Utc>,
}

/// One batch returned by the feed reader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchBatch {
    pub signals_found: usize,
    pub results_updated: usize,
    pub signals: Vec<Signal>,
}

/// Error types for the signal engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("feed request failed: {0}")]
    Feed(String),

    #[error("feed request timed out after {secs}s")]
    FetchTimeout { secs: u64 },

    #[error("store request failed: {0}")]
    Store(String),

    #[error("execution target request failed: {0}")]
    Target(String),

    #[error("result already submitted for signal {signal_id} by user {user_id}")]
    DuplicateUserResult { signal_id: String, user_id: Uuid },
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Trait for the upstream feed reader
#[async_trait::async_trait]
pub trait FeedReader: Send + Sync {
    /// Fetch the latest signal batch. Idempotent; may be slow or fail.
    async fn fetch_latest(&self) -> Result<FetchBatch>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Trait for the persistent store backing signals and user results
#[async_trait::async_trait]
pub trait SignalStore: Send + Sync {
    /// Attach the agent's executed/failed outcome to a signal
    async fn record_agent_status(&self, signal_id: &str, status: AgentStatus) -> Result<()>;

    /// Submit a self-reported result for `(signal_id, user_id)`
    async fn submit_user_result(
        &self,
        signal_id: &str,
        user_id: Uuid,
        result: UserOutcome,
    ) -> Result<UserResult>;
}
