//! Lifecycle resolution - derive a signal's state purely from time and data
//!
//! Nothing here is stored or memoized: the state is recomputed from the
//! signal and the wall clock on every call, so any number of observers
//! (dashboard refreshes, the agent loop) can evaluate it without
//! coordination.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::types::{Outcome, Signal};

/// An entry time interpreted on the arrival date that lands more than
/// this far ahead of arrival actually belongs to the prior day's schedule.
const ROLLOVER_THRESHOLD_HOURS: i64 = 6;

/// Lifecycle state of a signal, derived from its entry window and the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "result")]
pub enum LifecycleState {
    /// Entry time not reached yet (or unknown)
    Pending,
    /// Inside the entry window
    Executing,
    /// Window closed, no authoritative outcome yet
    AwaitingResult,
    /// Curator has published the outcome; timing no longer matters
    Resolved(Outcome),
}

/// Parse a time-of-day string, requiring at least hour and minute.
fn parse_entry_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Absolute entry timestamp: the signal's arrival date combined with its
/// declared time-of-day.
///
/// The feed emits only a time-of-day, so a signal received shortly after
/// midnight may declare an entry that, read on the arrival date, sits many
/// hours in the future. With `apply_rollover` the anchor is pulled back one
/// day when it lands more than six hours after arrival. The display path
/// applies the correction; the execution matcher does not (see
/// `agent-runner`), since anything that far out fails its early-tolerance
/// check anyway.
///
/// Returns `None` when the entry time is absent or unparsable.
pub fn entry_anchor(signal: &Signal, apply_rollover: bool) -> Option<DateTime<Utc>> {
    let raw = signal.entry_time.as_deref()?;
    let time = parse_entry_time(raw)?;
    let mut anchor = signal.received_at.date_naive().and_time(time).and_utc();

    if apply_rollover
        && anchor.signed_duration_since(signal.received_at)
            > Duration::hours(ROLLOVER_THRESHOLD_HOURS)
    {
        anchor -= Duration::days(1);
    }

    Some(anchor)
}

/// Parse a timeframe string into a window length in minutes.
///
/// A leading unit letter (`M` minutes, `H` hours) followed by digits;
/// anything else falls back to a 1-minute window rather than erroring.
pub fn window_minutes(timeframe: &str) -> i64 {
    let tf = timeframe.trim();
    let Some(unit) = tf.chars().next() else {
        return 1;
    };
    let value: i64 = match tf[unit.len_utf8()..].parse() {
        Ok(v) if v > 0 => v,
        _ => return 1,
    };
    match unit.to_ascii_uppercase() {
        'M' => value,
        'H' => value * 60,
        _ => 1,
    }
}

/// Compute the lifecycle state of a signal at `now`.
///
/// Total and deterministic: an authoritative result short-circuits timing
/// entirely, and malformed entry data degrades to `Pending` instead of
/// failing.
pub fn lifecycle_state(signal: &Signal, now: DateTime<Utc>) -> LifecycleState {
    if let Some(result) = signal.official_result {
        return LifecycleState::Resolved(result);
    }

    let Some(anchor) = entry_anchor(signal, true) else {
        return LifecycleState::Pending;
    };

    let window_end = anchor + Duration::minutes(window_minutes(&signal.timeframe));

    if now < anchor {
        LifecycleState::Pending
    } else if now <= window_end {
        LifecycleState::Executing
    } else {
        LifecycleState::AwaitingResult
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use chrono::TimeZone;

    fn signal(entry_time: Option<&str>, timeframe: &str, received_at: DateTime<Utc>) -> Signal {
        Signal {
            id: "sig-1".to_string(),
            asset: "EURUSD".to_string(),
            direction: Direction::Call,
            timeframe: timeframe.to_string(),
            entry_time: entry_time.map(str::to_string),
            received_at,
            official_result: None,
            agent_status: None,
        }
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_official_result_short_circuits_timing() {
        let received = utc(2024, 1, 1, 9, 0, 0);
        let mut sig = signal(Some("10:00:00"), "M15", received);
        sig.official_result = Some(Outcome::Win1);

        // Resolved for every clock reading, including before the entry time
        for now in [
            utc(2024, 1, 1, 8, 0, 0),
            utc(2024, 1, 1, 10, 5, 0),
            utc(2024, 1, 2, 0, 0, 0),
        ] {
            assert_eq!(
                lifecycle_state(&sig, now),
                LifecycleState::Resolved(Outcome::Win1)
            );
        }
    }

    #[test]
    fn test_missing_entry_time_is_pending() {
        let received = utc(2024, 1, 1, 9, 0, 0);
        let sig = signal(None, "M15", received);
        for now in [utc(2024, 1, 1, 9, 0, 0), utc(2024, 6, 1, 0, 0, 0)] {
            assert_eq!(lifecycle_state(&sig, now), LifecycleState::Pending);
        }
    }

    #[test]
    fn test_malformed_entry_time_is_pending() {
        let received = utc(2024, 1, 1, 9, 0, 0);
        for bad in ["soon", "25:99", "8", ""] {
            let sig = signal(Some(bad), "M15", received);
            assert_eq!(
                lifecycle_state(&sig, utc(2024, 1, 1, 12, 0, 0)),
                LifecycleState::Pending,
                "entry_time {:?} should degrade to Pending",
                bad
            );
        }
    }

    #[test]
    fn test_entry_time_without_seconds_parses() {
        let received = utc(2024, 1, 1, 9, 0, 0);
        let sig = signal(Some("10:00"), "M15", received);
        let anchor = entry_anchor(&sig, true).unwrap();
        assert_eq!(anchor, utc(2024, 1, 1, 10, 0, 0));
    }

    #[test]
    fn test_rollover_correction() {
        // Received just after midnight; an 08:00 entry read on the arrival
        // date would sit 7h50m in the future, so it belongs to the prior day.
        let received = utc(2024, 1, 1, 0, 10, 0);
        let sig = signal(Some("08:00:00"), "M15", received);

        let anchor = entry_anchor(&sig, true).unwrap();
        assert_eq!(anchor, utc(2023, 12, 31, 8, 0, 0));

        // Without the correction the raw anchor stands
        let raw = entry_anchor(&sig, false).unwrap();
        assert_eq!(raw, utc(2024, 1, 1, 8, 0, 0));
    }

    #[test]
    fn test_no_rollover_within_threshold() {
        let received = utc(2024, 1, 1, 9, 0, 0);
        let sig = signal(Some("14:00:00"), "M15", received);
        // 5h ahead of arrival, under the 6h threshold
        assert_eq!(
            entry_anchor(&sig, true).unwrap(),
            utc(2024, 1, 1, 14, 0, 0)
        );
    }

    #[test]
    fn test_window_minutes_parsing() {
        assert_eq!(window_minutes("M15"), 15);
        assert_eq!(window_minutes("M1"), 1);
        assert_eq!(window_minutes("H4"), 240);
        assert_eq!(window_minutes("h1"), 60);
        // Unparsable forms default to one minute
        assert_eq!(window_minutes("weekly"), 1);
        assert_eq!(window_minutes(""), 1);
        assert_eq!(window_minutes("M"), 1);
        assert_eq!(window_minutes("M-5"), 1);
    }

    #[test]
    fn test_window_transitions() {
        // anchor 10:00, M15 window => window end 10:15
        let received = utc(2024, 1, 1, 9, 30, 0);
        let sig = signal(Some("10:00:00"), "M15", received);

        assert_eq!(
            lifecycle_state(&sig, utc(2024, 1, 1, 9, 59, 0)),
            LifecycleState::Pending
        );
        assert_eq!(
            lifecycle_state(&sig, utc(2024, 1, 1, 10, 5, 0)),
            LifecycleState::Executing
        );
        assert_eq!(
            lifecycle_state(&sig, utc(2024, 1, 1, 10, 20, 0)),
            LifecycleState::AwaitingResult
        );
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let received = utc(2024, 1, 1, 9, 30, 0);
        let sig = signal(Some("10:00:00"), "M15", received);

        assert_eq!(
            lifecycle_state(&sig, utc(2024, 1, 1, 10, 0, 0)),
            LifecycleState::Executing
        );
        assert_eq!(
            lifecycle_state(&sig, utc(2024, 1, 1, 10, 15, 0)),
            LifecycleState::Executing
        );
        assert_eq!(
            lifecycle_state(&sig, utc(2024, 1, 1, 10, 15, 1)),
            LifecycleState::AwaitingResult
        );
    }

    #[test]
    fn test_hour_timeframe_window() {
        let received = utc(2024, 1, 1, 9, 30, 0);
        let sig = signal(Some("10:00:00"), "H4", received);

        assert_eq!(
            lifecycle_state(&sig, utc(2024, 1, 1, 13, 59, 0)),
            LifecycleState::Executing
        );
        assert_eq!(
            lifecycle_state(&sig, utc(2024, 1, 1, 14, 1, 0)),
            LifecycleState::AwaitingResult
        );
    }
}
