//! Signal ingestion - single-flight polling of the upstream feed
//!
//! One `SignalIngestor` owns one periodic fetch loop. The single-flight
//! guard lives on the instance, so multiple ingestors (one per dashboard
//! surface) never interfere with each other.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::types::{AgentStatus, FeedReader, FetchBatch, Signal};

/// Ingestor tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct IngestorConfig {
    /// Fixed polling period
    pub poll_interval: Duration,
    /// Upper bound on one feed call, so a hung request cannot hold the
    /// single-flight guard indefinitely
    pub fetch_timeout: Duration,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            fetch_timeout: Duration::from_secs(15),
        }
    }
}

/// Change notification sent to subscribers after a completed merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// A fetch batch was merged into the collection
    BatchMerged {
        new_signals: usize,
        updated_results: usize,
    },
    /// The execution agent reported back on a signal
    AgentStatusRecorded {
        signal_id: String,
        status: AgentStatus,
    },
}

/// Counters from the most recent successful poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub signals_found: usize,
    pub results_updated: usize,
}

impl PollStats {
    pub fn changed(&self) -> bool {
        self.signals_found > 0 || self.results_updated > 0
    }
}

/// What one tick of the poll loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Fetch succeeded and the batch was merged
    Merged(PollStats),
    /// A fetch was already in flight; this tick did nothing
    Skipped,
    /// Fetch failed or timed out; collection untouched
    Failed,
    /// Ingestor was stopped while the fetch was in flight; batch discarded
    Discarded,
    /// Ingestor already stopped; no fetch started
    Stopped,
}

/// Polls the feed on a fixed period and owns the local signal collection.
pub struct SignalIngestor {
    feed: Arc<dyn FeedReader>,
    config: IngestorConfig,
    signals: RwLock<HashMap<String, Signal>>,
    is_fetching: AtomicBool,
    stopped: AtomicBool,
    last_poll: RwLock<PollStats>,
    events: broadcast::Sender<IngestEvent>,
}

impl SignalIngestor {
    pub fn new(feed: Arc<dyn FeedReader>, config: IngestorConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            feed,
            config,
            signals: RwLock::new(HashMap::new()),
            is_fetching: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            last_poll: RwLock::new(PollStats::default()),
            events,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.events.subscribe()
    }

    /// Consistent snapshot of the current collection. Cloned under the
    /// read lock, so observers never see a partially merged batch.
    pub async fn snapshot(&self) -> Vec<Signal> {
        self.signals.read().await.values().cloned().collect()
    }

    /// Look up one signal by id
    pub async fn get(&self, signal_id: &str) -> Option<Signal> {
        self.signals.read().await.get(signal_id).cloned()
    }

    /// Counters from the most recent successful poll
    pub async fn last_poll(&self) -> PollStats {
        *self.last_poll.read().await
    }

    /// Stop the ingestor. Idempotent; an in-flight fetch is allowed to
    /// finish but its batch is discarded, and no further tick starts one.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            info!("signal ingestor stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// One tick of the poll loop: guarded fetch, merge, notify.
    ///
    /// If a previous fetch is still in flight the tick is skipped outright;
    /// ticks are never queued behind a slow request.
    pub async fn poll_once(&self) -> PollOutcome {
        if self.is_stopped() {
            return PollOutcome::Stopped;
        }

        if self
            .is_fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("fetch already in flight, skipping tick");
            return PollOutcome::Skipped;
        }

        let outcome = match tokio::time::timeout(
            self.config.fetch_timeout,
            self.feed.fetch_latest(),
        )
        .await
        {
            Ok(Ok(batch)) => {
                if self.is_stopped() {
                    debug!("ingestor stopped during fetch, discarding batch");
                    PollOutcome::Discarded
                } else {
                    let stats = self.merge_batch(batch).await;
                    if stats.changed() {
                        let _ = self.events.send(IngestEvent::BatchMerged {
                            new_signals: stats.signals_found,
                            updated_results: stats.results_updated,
                        });
                    }
                    PollOutcome::Merged(stats)
                }
            }
            Ok(Err(e)) => {
                warn!("feed fetch from {} failed: {}", self.feed.name(), e);
                PollOutcome::Failed
            }
            Err(_) => {
                warn!(
                    "feed fetch from {} timed out after {}s",
                    self.feed.name(),
                    self.config.fetch_timeout.as_secs()
                );
                PollOutcome::Failed
            }
        };

        self.is_fetching.store(false, Ordering::Release);
        outcome
    }

    /// Merge a fetch batch into the collection by id.
    ///
    /// New ids are inserted whole. For known ids only the mutable fields
    /// move: `agent_status` is last-write-wins, `official_result` is set
    /// once and never overwritten.
    async fn merge_batch(&self, batch: FetchBatch) -> PollStats {
        let mut map = self.signals.write().await;
        let mut new_signals = 0;
        let mut updated_results = 0;

        for incoming in batch.signals {
            match map.entry(incoming.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(incoming);
                    new_signals += 1;
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    if existing.official_result.is_none() && incoming.official_result.is_some() {
                        existing.official_result = incoming.official_result;
                        updated_results += 1;
                    }
                    if incoming.agent_status.is_some()
                        && incoming.agent_status != existing.agent_status
                    {
                        existing.agent_status = incoming.agent_status;
                    }
                }
            }
        }
        drop(map);

        let stats = PollStats {
            signals_found: new_signals,
            results_updated: updated_results,
        };
        *self.last_poll.write().await = stats;

        if stats.changed() {
            info!(
                "merged feed batch: {} new signals, {} updated results",
                stats.signals_found, stats.results_updated
            );
        }
        stats
    }

    /// Merge the execution agent's report back into the collection and
    /// notify subscribers.
    pub async fn record_agent_status(&self, signal_id: &str, status: AgentStatus) {
        let mut map = self.signals.write().await;
        match map.get_mut(signal_id) {
            Some(signal) => signal.agent_status = Some(status),
            None => {
                warn!("agent status for unknown signal {}", signal_id);
                return;
            }
        }
        drop(map);

        let _ = self.events.send(IngestEvent::AgentStatusRecorded {
            signal_id: signal_id.to_string(),
            status,
        });
    }

    /// Run the poll loop until `shutdown` fires.
    ///
    /// Each tick spawns its poll so a slow fetch never delays the timer;
    /// the single-flight guard turns overlapping ticks into skips.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            "signal ingestor polling {} every {:?}",
            self.feed.name(),
            self.config.poll_interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.is_stopped() {
                        break;
                    }
                    let ingestor = Arc::clone(&self);
                    tokio::spawn(async move {
                        ingestor.poll_once().await;
                    });
                }
                _ = shutdown.changed() => {
                    self.stop();
                    break;
                }
            }
        }
    }
}
