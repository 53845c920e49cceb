//! Execution matching - decide whether the agent should act on a signal now
//!
//! The action window is deliberately looser than the display lifecycle:
//! the agent tolerates firing well after the nominal entry to absorb
//! polling latency, where the dashboard would already show the signal as
//! awaiting a result.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use signal_engine::status::entry_anchor;
use signal_engine::types::Signal;

/// How many minutes before the entry anchor the agent refuses to fire
const EARLY_TOLERANCE_MIN: i64 = 10;

/// Should the agent act on this signal right now?
///
/// Signals without a usable entry time are always eligible. Otherwise the
/// anchor is the raw arrival-date + time-of-day (no rollover correction:
/// a prior-day anchor would only make the signal *more* eligible here,
/// and a far-future one already fails the early check). The only
/// rejection is being more than ten minutes early; late signals fire
/// however stale, so a slow poll cycle never strands an entry.
pub fn should_execute(signal: &Signal, now: DateTime<Utc>) -> bool {
    let Some(anchor) = entry_anchor(signal, false) else {
        return true;
    };
    anchor.signed_duration_since(now) <= Duration::minutes(EARLY_TOLERANCE_MIN)
}

/// Signal ids already actioned in this agent run.
///
/// Ephemeral by design: created empty at start, grows monotonically, never
/// persisted. An entry is added whether the attempt landed or failed, so a
/// transient target failure is never retried.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    ids: HashSet<String>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an id as actioned. Returns false if it was already present.
    pub fn mark(&mut self, signal_id: &str) -> bool {
        self.ids.insert(signal_id.to_string())
    }

    pub fn contains(&self, signal_id: &str) -> bool {
        self.ids.contains(signal_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use signal_engine::types::Direction;

    fn signal(entry_time: Option<&str>) -> Signal {
        Signal {
            id: "sig-1".to_string(),
            asset: "EURUSD".to_string(),
            direction: Direction::Call,
            timeframe: "M15".to_string(),
            entry_time: entry_time.map(str::to_string),
            received_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
            official_result: None,
            agent_status: None,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_no_entry_time_always_eligible() {
        assert!(should_execute(&signal(None), at(3, 0)));
        // Unparsable entry time behaves like no entry time
        assert!(should_execute(&signal(Some("whenever")), at(3, 0)));
    }

    #[test]
    fn test_action_window_tolerances() {
        let sig = signal(Some("10:00:00"));

        // 8 minutes early: inside tolerance
        assert!(should_execute(&sig, at(9, 52)));
        // 12 minutes early: too early
        assert!(!should_execute(&sig, at(9, 48)));
        // 5 minutes late: inside the window
        assert!(should_execute(&sig, at(10, 5)));
        // 8 minutes late: past the nominal window, catch-up still fires
        assert!(should_execute(&sig, at(10, 8)));
        // Much later still fires
        assert!(should_execute(&sig, at(13, 0)));
    }

    #[test]
    fn test_early_boundary() {
        let sig = signal(Some("10:00:00"));
        // Exactly 10 minutes early is still eligible
        assert!(should_execute(&sig, at(9, 50)));
        // 11 minutes early is not
        assert!(!should_execute(&sig, at(9, 49)));
    }

    #[test]
    fn test_processed_set_monotonic() {
        let mut set = ProcessedSet::new();
        assert!(set.is_empty());

        assert!(set.mark("a"));
        assert!(!set.mark("a"));
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
        assert_eq!(set.len(), 1);

        assert!(set.mark("b"));
        assert_eq!(set.len(), 2);
    }
}
