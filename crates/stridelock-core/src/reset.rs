//! Daily reset of per-day counters.
//!
//! Runs at monitoring-session start (or reconnection) and on the first
//! reading after midnight: when the persisted last-reset date differs from
//! the current local day, today's counters and the counter-source baseline
//! are cleared and the new date persisted. The emergency *flag* survives
//! rollover; only the countdown notice is cancelled by the caller.

use chrono::NaiveDate;

use crate::movement::ProgressState;
use crate::store::Prefs;

/// Whether a rollover is due for `today`.
pub fn rollover_due(last_reset: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_reset != Some(today)
}

/// Zero the per-day counters in both the preferences and the live progress
/// state. The caller persists `prefs` and cancels any emergency notice.
pub fn apply_rollover(prefs: &mut Prefs, progress: &mut ProgressState, today: NaiveDate) {
    prefs.steps_today = 0;
    prefs.distance_today_km = 0.0;
    prefs.sensor_baseline = None;
    prefs.detector_steps = 0;
    prefs.last_reset_date = Some(today);
    progress.reset_for(today);
}
