//! Agent Runner - Main execution loop
//!
//! Polls the ingestor's collection on a fixed period and fires eligible
//! signals at the execution target, once each, reporting the outcome back
//! to the store and the local collection.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, warn};

use signal_engine::ingestor::SignalIngestor;
use signal_engine::types::{AgentStatus, SignalStore};

use crate::matcher::{should_execute, ProcessedSet};
use crate::target::ExecutionTarget;

/// Main agent runner that manages the execution loop
pub struct AgentRunner {
    ingestor: Arc<SignalIngestor>,
    target: Arc<dyn ExecutionTarget>,
    store: Arc<dyn SignalStore>,
    processed: ProcessedSet,
    trade_amount: Decimal,
    tick_interval: Duration,
}

impl AgentRunner {
    /// Create new agent runner
    pub fn new(
        ingestor: Arc<SignalIngestor>,
        target: Arc<dyn ExecutionTarget>,
        store: Arc<dyn SignalStore>,
        trade_amount: Decimal,
        tick_interval: Duration,
    ) -> Self {
        Self {
            ingestor,
            target,
            store,
            processed: ProcessedSet::new(),
            trade_amount,
            tick_interval,
        }
    }

    /// Run the main agent loop until `shutdown` fires
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            "Agent runner starting, trade amount {}, tick every {:?}",
            self.trade_amount, self.tick_interval
        );

        let mut events = self.ingestor.subscribe();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let attempted = self.run_cycle().await;
                    if attempted > 0 {
                        info!("Execution cycle attempted {} signal(s)", attempted);
                    }
                }
                event = events.recv() => {
                    if let Ok(event) = event {
                        debug!("Ingest event: {:?}", event);
                    }
                }
                _ = shutdown.changed() => {
                    info!("Agent runner stopping");
                    break;
                }
            }
        }
    }

    /// One execution cycle over the current collection snapshot.
    pub async fn run_cycle(&mut self) -> usize {
        self.run_cycle_at(Utc::now()).await
    }

    /// One execution cycle evaluated against an explicit clock reading.
    ///
    /// Every signal that clears the matcher is attempted exactly once per
    /// run: it is marked processed whether the attempt landed, missed, or
    /// errored, so the agent never storms a surface it does not control.
    /// Returns the number of attempts made.
    pub async fn run_cycle_at(&mut self, now: chrono::DateTime<Utc>) -> usize {
        let mut attempted = 0;

        for signal in self.ingestor.snapshot().await {
            if self.processed.contains(&signal.id) {
                continue;
            }
            if !should_execute(&signal, now) {
                continue;
            }

            let status = match self.target.attempt(&signal, self.trade_amount).await {
                Ok(outcome) if outcome.success => {
                    info!(
                        "Executed signal {} ({} {})",
                        signal.id, signal.direction, signal.asset
                    );
                    AgentStatus::Executed
                }
                Ok(outcome) => {
                    warn!(
                        "Execution attempt for signal {} missed: {}",
                        signal.id, outcome.message
                    );
                    AgentStatus::Failed
                }
                Err(e) => {
                    warn!("Execution attempt for signal {} errored: {}", signal.id, e);
                    AgentStatus::Failed
                }
            };

            self.processed.mark(&signal.id);
            attempted += 1;

            if let Err(e) = self.store.record_agent_status(&signal.id, status).await {
                warn!("Failed to record agent status for {}: {}", signal.id, e);
            }
            self.ingestor.record_agent_status(&signal.id, status).await;
        }

        attempted
    }

    /// Ids actioned so far in this run
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }
}
