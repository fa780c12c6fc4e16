//! Emergency override window.
//!
//! A fixed-duration bypass the user can trigger from outside the core. The
//! engine never self-activates it; it only reads the window and expires it
//! lazily at the next evaluation, so a block after expiry can be delayed
//! until the next app switch. That imprecision is documented policy, not a
//! defect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Prefs;

/// Length of the override window.
pub const EMERGENCY_WINDOW_SECS: u64 = 900;

/// The override window state. Created externally; destroyed by explicit
/// cancellation or by the engine detecting expiry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmergencyState {
    pub active: bool,
    pub start_time: Option<DateTime<Utc>>,
}

impl EmergencyState {
    pub fn inactive() -> Self {
        Self {
            active: false,
            start_time: None,
        }
    }

    pub fn activated_at(now: DateTime<Utc>) -> Self {
        Self {
            active: true,
            start_time: Some(now),
        }
    }

    pub fn from_prefs(prefs: &Prefs) -> Self {
        Self {
            active: prefs.emergency_active,
            start_time: prefs.emergency_start,
        }
    }

    pub fn write_prefs(&self, prefs: &mut Prefs) {
        prefs.emergency_active = self.active;
        prefs.emergency_start = self.start_time;
    }

    /// Whole seconds since activation. An active flag without a start time
    /// counts as already expired.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        match self.start_time {
            Some(start) => (now - start).num_seconds().max(0) as u64,
            None => u64::MAX,
        }
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        self.elapsed_secs(now) >= EMERGENCY_WINDOW_SECS
    }

    /// Seconds left in the window, zero once expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        EMERGENCY_WINDOW_SECS.saturating_sub(self.elapsed_secs(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn countdown_decreases_to_expiry() {
        let t0 = Utc::now();
        let em = EmergencyState::activated_at(t0);

        assert_eq!(em.remaining_secs(t0), 900);
        assert_eq!(em.remaining_secs(t0 + Duration::seconds(1)), 899);
        assert_eq!(em.remaining_secs(t0 + Duration::seconds(899)), 1);
        assert!(!em.expired(t0 + Duration::seconds(899)));
        assert!(em.expired(t0 + Duration::seconds(900)));
        assert_eq!(em.remaining_secs(t0 + Duration::seconds(901)), 0);
    }

    #[test]
    fn active_without_start_is_expired() {
        let em = EmergencyState {
            active: true,
            start_time: None,
        };
        assert!(em.expired(Utc::now()));
    }

    #[test]
    fn prefs_roundtrip() {
        let mut prefs = Prefs::default();
        let t0 = Utc::now();
        EmergencyState::activated_at(t0).write_prefs(&mut prefs);
        assert!(prefs.emergency_active);
        assert_eq!(prefs.emergency_start, Some(t0));
        assert_eq!(EmergencyState::from_prefs(&prefs).start_time, Some(t0));
    }
}
