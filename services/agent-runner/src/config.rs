//! Agent configuration loaded from environment

use rust_decimal::Decimal;
use std::time::Duration;

/// Configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub store_url: String,
    pub target_url: String,
    pub trade_amount: Decimal,
    pub poll_interval: Duration,
    pub agent_tick_interval: Duration,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let feed_url = std::env::var("ENGINE_FEED_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let store_url = std::env::var("ENGINE_STORE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let target_url = std::env::var("AGENT_TARGET_URL")
            .unwrap_or_else(|_| "http://localhost:7070".to_string());

        let trade_amount = std::env::var("AGENT_TRADE_AMOUNT")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<Decimal>()
            .map_err(|e| anyhow::anyhow!("Invalid AGENT_TRADE_AMOUNT: {}", e))?;

        let poll_interval = env_secs("ENGINE_POLL_SECS", 3)?;
        let agent_tick_interval = env_secs("AGENT_TICK_SECS", 4)?;
        let fetch_timeout = env_secs("ENGINE_FETCH_TIMEOUT_SECS", 15)?;

        Ok(Self {
            feed_url,
            store_url,
            target_url,
            trade_amount,
            poll_interval,
            agent_tick_interval,
            fetch_timeout,
        })
    }
}

fn env_secs(name: &str, default: u64) -> anyhow::Result<Duration> {
    match std::env::var(name) {
        Ok(raw) => {
            let secs = raw
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // Only exercises the default branch; env vars are not set in tests
        let config = Config::from_env().unwrap();
        assert_eq!(config.trade_amount, Decimal::from(1));
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.agent_tick_interval, Duration::from_secs(4));
    }
}
