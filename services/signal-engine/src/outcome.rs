//! Result resolution - reconcile authoritative and self-reported outcomes

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::status::{lifecycle_state, LifecycleState};
use crate::types::{Outcome, Signal, UserOutcome, UserResult};

/// What the dashboard should show for a signal's outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "result")]
pub enum DisplayResult {
    /// Curated outcome; always wins
    Official(Outcome),
    /// User-submitted outcome, shown only while no official one exists
    SelfReported(UserOutcome),
    None,
}

/// Resolve the display outcome for a signal.
///
/// The official result, once set, takes precedence over anything a user
/// submitted earlier.
pub fn display_result(signal: &Signal, user_result: Option<&UserResult>) -> DisplayResult {
    if let Some(official) = signal.official_result {
        return DisplayResult::Official(official);
    }
    match user_result {
        Some(user) => DisplayResult::SelfReported(user.result),
        None => DisplayResult::None,
    }
}

/// Whether a user may submit a self-reported result right now: the
/// execution window has closed and no official result exists yet.
pub fn self_report_open(signal: &Signal, now: DateTime<Utc>) -> bool {
    signal.official_result.is_none()
        && lifecycle_state(signal, now) == LifecycleState::AwaitingResult
}

/// Whether the dashboard should prompt this user to self-report: the
/// window is open for submissions and nothing is on display yet.
pub fn needs_self_report(
    signal: &Signal,
    user_result: Option<&UserResult>,
    now: DateTime<Utc>,
) -> bool {
    display_result(signal, user_result) == DisplayResult::None && self_report_open(signal, now)
}
