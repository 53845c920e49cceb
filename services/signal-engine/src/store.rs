//! Persistent store client - agent statuses and user-submitted results

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{AgentStatus, EngineError, Result, SignalStore, UserOutcome, UserResult};

/// HTTP client for the managed store behind the dashboard
pub struct StoreClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AgentStatusRequest {
    status: AgentStatus,
}

#[derive(Debug, Serialize)]
struct UserResultRequest {
    user_id: Uuid,
    result: UserOutcome,
}

impl StoreClient {
    /// Create new store client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EngineError::Store(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SignalStore for StoreClient {
    async fn record_agent_status(&self, signal_id: &str, status: AgentStatus) -> Result<()> {
        let url = format!("{}/v1/signals/{}/agent_status", self.base_url, signal_id);

        let response = self
            .client
            .post(&url)
            .json(&AgentStatusRequest { status })
            .send()
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;

        if response.status().is_success() {
            debug!("Recorded agent status {} for signal {}", status, signal_id);
            Ok(())
        } else {
            let status_code = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(EngineError::Store(format!("{} - {}", status_code, text)))
        }
    }

    async fn submit_user_result(
        &self,
        signal_id: &str,
        user_id: Uuid,
        result: UserOutcome,
    ) -> Result<UserResult> {
        let url = format!("{}/v1/signals/{}/results", self.base_url, signal_id);

        let response = self
            .client
            .post(&url)
            .json(&UserResultRequest { user_id, result })
            .send()
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let row: UserResult = response
                    .json()
                    .await
                    .map_err(|e| EngineError::Store(format!("invalid response: {}", e)))?;
                info!("User {} reported {:?} on signal {}", user_id, result, signal_id);
                Ok(row)
            }
            // The store enforces one result per (signal, user)
            reqwest::StatusCode::CONFLICT => Err(EngineError::DuplicateUserResult {
                signal_id: signal_id.to_string(),
                user_id,
            }),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(EngineError::Store(format!("{} - {}", status, text)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_record_agent_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/signals/sig-1/agent_status"))
            .and(body_json(serde_json::json!({ "status": "executed" })))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = StoreClient::new(&server.uri()).unwrap();
        client
            .record_agent_status("sig-1", AgentStatus::Executed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_user_result_surfaces_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/signals/sig-1/results"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let client = StoreClient::new(&server.uri()).unwrap();
        let user_id = Uuid::new_v4();
        let err = client
            .submit_user_result("sig-1", user_id, UserOutcome::Win)
            .await
            .unwrap_err();

        match err {
            EngineError::DuplicateUserResult { signal_id, user_id: uid } => {
                assert_eq!(signal_id, "sig-1");
                assert_eq!(uid, user_id);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
