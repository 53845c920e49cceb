//! Agent Runner - Autonomous execution agent for the signals dashboard
//!
//! This is the agent that acts on ingested signals:
//! 1. Polls the upstream feed through the signal-engine ingestor
//! 2. Matches each signal's entry window against the clock
//! 3. Fires eligible signals at the execution target, once each
//! 4. Reports executed/failed outcomes back to the store

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use agent_runner::{AgentRunner, Config, TargetClient};
use signal_engine::{FeedClient, IngestorConfig, SignalIngestor, StoreClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting Agent Runner...");

    let config = Config::from_env()?;
    info!(
        "Feed: {}, Store: {}, Target: {}",
        config.feed_url, config.store_url, config.target_url
    );

    let feed = Arc::new(FeedClient::new(&config.feed_url)?);
    let store = Arc::new(StoreClient::new(&config.store_url)?);
    let target = Arc::new(TargetClient::new(&config.target_url)?);

    let ingestor = Arc::new(SignalIngestor::new(
        feed,
        IngestorConfig {
            poll_interval: config.poll_interval,
            fetch_timeout: config.fetch_timeout,
        },
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ingest_handle = tokio::spawn(Arc::clone(&ingestor).run(shutdown_rx.clone()));

    let runner = AgentRunner::new(
        Arc::clone(&ingestor),
        target,
        store,
        config.trade_amount,
        config.agent_tick_interval,
    );
    let runner_handle = tokio::spawn(runner.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = ingest_handle.await;
    let _ = runner_handle.await;

    Ok(())
}
