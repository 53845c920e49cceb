//! Feed reader client - pulls the latest signal batch from the upstream feed

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::types::{EngineError, FeedReader, FetchBatch, Result};

/// HTTP client for the upstream signal feed
pub struct FeedClient {
    client: Client,
    base_url: String,
}

impl FeedClient {
    /// Create new feed client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EngineError::Feed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_latest_inner(&self) -> Result<FetchBatch> {
        let url = format!("{}/v1/signals/latest", self.base_url);
        debug!("Fetching latest signals from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::Feed(e.to_string()))?;

        if response.status().is_success() {
            let batch: FetchBatch = response
                .json()
                .await
                .map_err(|e| EngineError::Feed(format!("invalid response: {}", e)))?;
            debug!(
                "Feed returned {} signals ({} results updated)",
                batch.signals_found, batch.results_updated
            );
            Ok(batch)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(EngineError::Feed(format!("{} - {}", status, text)))
        }
    }
}

#[async_trait::async_trait]
impl FeedReader for FeedClient {
    async fn fetch_latest(&self) -> Result<FetchBatch> {
        self.fetch_latest_inner().await
    }

    fn name(&self) -> &str {
        "feed"
    }
}
