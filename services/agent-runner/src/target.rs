//! Execution target client - the UI surface the agent drives
//!
//! The bridge behind this endpoint automates whatever trading surface the
//! user connected. Its mechanism is opaque here; the agent only learns
//! whether the attempt landed.

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use signal_engine::types::{Direction, EngineError, Result, Signal};

/// Outcome of one execution attempt
#[derive(Debug, Clone, Deserialize)]
pub struct AttemptOutcome {
    /// False covers "control not found" and any other non-fatal miss
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Trait for the surface the agent drives
#[async_trait::async_trait]
pub trait ExecutionTarget: Send + Sync {
    /// Attempt to place the signal's trade. A miss is a normal outcome,
    /// not an error; errors are reserved for transport failures.
    async fn attempt(&self, signal: &Signal, amount: Decimal) -> Result<AttemptOutcome>;
}

/// HTTP client for the UI-automation bridge
pub struct TargetClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AttemptRequest<'a> {
    signal_id: &'a str,
    asset: &'a str,
    direction: Direction,
    amount: Decimal,
}

impl TargetClient {
    /// Create new execution target client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EngineError::Target(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ExecutionTarget for TargetClient {
    async fn attempt(&self, signal: &Signal, amount: Decimal) -> Result<AttemptOutcome> {
        let url = format!("{}/v1/attempts", self.base_url);
        debug!(
            "Attempting {} {} for signal {}",
            signal.direction, signal.asset, signal.id
        );

        let response = self
            .client
            .post(&url)
            .json(&AttemptRequest {
                signal_id: &signal.id,
                asset: &signal.asset,
                direction: signal.direction,
                amount,
            })
            .send()
            .await
            .map_err(|e| EngineError::Target(e.to_string()))?;

        if response.status().is_success() {
            let outcome: AttemptOutcome = response
                .json()
                .await
                .map_err(|e| EngineError::Target(format!("invalid response: {}", e)))?;
            Ok(outcome)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(EngineError::Target(format!("{} - {}", status, text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_outcome_message_optional() {
        // Some bridge builds omit the message on success
        let outcome: AttemptOutcome = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.message, "");

        let miss: AttemptOutcome =
            serde_json::from_str(r#"{"success": false, "message": "control not found"}"#).unwrap();
        assert!(!miss.success);
        assert_eq!(miss.message, "control not found");
    }
}
