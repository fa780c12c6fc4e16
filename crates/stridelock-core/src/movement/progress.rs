//! Per-day movement counters.
//!
//! Owned exclusively by the movement manager; everything else reads
//! snapshots. Within a single local day the counters are monotonically
//! non-decreasing regardless of which source feeds them, and the
//! cumulative-counter baseline is captured at most once per day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Today's movement progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub steps_today: u64,
    pub distance_today_km: f64,
    /// Lifetime counter total captured on the first reading after reset.
    pub sensor_baseline: Option<u64>,
    pub last_reset_date: NaiveDate,
}

impl ProgressState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            steps_today: 0,
            distance_today_km: 0.0,
            sensor_baseline: None,
            last_reset_date: date,
        }
    }

    /// Absorb a lifetime total from the cumulative counter.
    ///
    /// The first reading of the day becomes the baseline (today's count
    /// starts at zero from there); returns `true` when the baseline was
    /// captured so the caller can persist it synchronously.
    pub fn record_counter_total(&mut self, total: u64) -> bool {
        match self.sensor_baseline {
            None => {
                self.sensor_baseline = Some(total);
                true
            }
            Some(baseline) => {
                // A total below the baseline means the hardware rebooted;
                // freeze rather than go backwards.
                let derived = total.saturating_sub(baseline);
                self.steps_today = self.steps_today.max(derived);
                false
            }
        }
    }

    /// Absorb a "steps today" aggregate (health-platform branch).
    pub fn record_steps_aggregate(&mut self, steps: u64) {
        self.steps_today = self.steps_today.max(steps);
    }

    /// Absorb a "distance today" aggregate, in kilometres.
    pub fn record_distance_aggregate(&mut self, km: f64) {
        if km > self.distance_today_km {
            self.distance_today_km = km;
        }
    }

    /// One detected step (detector / accelerometer branches).
    pub fn record_step(&mut self) {
        self.steps_today += 1;
    }

    /// Approximate distance from steps for sources without native distance.
    pub fn derive_distance(&mut self, steps_per_km: u32) {
        if steps_per_km == 0 {
            return;
        }
        let km = self.steps_today as f64 / steps_per_km as f64;
        self.record_distance_aggregate(km);
    }

    /// Zero everything for a new local day.
    pub fn reset_for(&mut self, date: NaiveDate) {
        self.steps_today = 0;
        self.distance_today_km = 0.0;
        self.sensor_baseline = None;
        self.last_reset_date = date;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn baseline_captured_once() {
        let mut p = ProgressState::new(day());
        assert!(p.record_counter_total(100_000));
        assert_eq!(p.sensor_baseline, Some(100_000));
        assert_eq!(p.steps_today, 0);

        assert!(!p.record_counter_total(100_250));
        assert_eq!(p.sensor_baseline, Some(100_000));
        assert_eq!(p.steps_today, 250);
    }

    #[test]
    fn hardware_reboot_freezes_instead_of_rewinding() {
        let mut p = ProgressState::new(day());
        p.record_counter_total(100_000);
        p.record_counter_total(103_000);
        assert_eq!(p.steps_today, 3000);

        // Counter restarted from zero after a reboot.
        p.record_counter_total(40);
        assert_eq!(p.steps_today, 3000);
    }

    #[test]
    fn aggregates_never_decrease() {
        let mut p = ProgressState::new(day());
        p.record_steps_aggregate(500);
        p.record_steps_aggregate(300);
        assert_eq!(p.steps_today, 500);

        p.record_distance_aggregate(1.2);
        p.record_distance_aggregate(0.8);
        assert_eq!(p.distance_today_km, 1.2);
    }

    #[test]
    fn derive_distance_uses_stride_constant() {
        let mut p = ProgressState::new(day());
        p.record_steps_aggregate(2600);
        p.derive_distance(1300);
        assert!((p.distance_today_km - 2.0).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_counters_and_baseline() {
        let mut p = ProgressState::new(day());
        p.record_counter_total(50_000);
        p.record_counter_total(55_000);
        p.record_distance_aggregate(3.5);

        let next = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        p.reset_for(next);
        assert_eq!(p.steps_today, 0);
        assert_eq!(p.distance_today_km, 0.0);
        assert_eq!(p.sensor_baseline, None);
        assert_eq!(p.last_reset_date, next);
    }

    proptest! {
        #[test]
        fn steps_monotone_under_arbitrary_totals(totals in proptest::collection::vec(0u64..10_000_000, 1..40)) {
            let mut p = ProgressState::new(day());
            let mut prev = 0u64;
            for total in totals {
                p.record_counter_total(total);
                prop_assert!(p.steps_today >= prev);
                prev = p.steps_today;
            }
        }

        #[test]
        fn aggregates_monotone_under_arbitrary_inputs(values in proptest::collection::vec(0u64..200_000, 1..40)) {
            let mut p = ProgressState::new(day());
            let mut prev = 0u64;
            for v in values {
                p.record_steps_aggregate(v);
                prop_assert!(p.steps_today >= prev);
                prev = p.steps_today;
            }
        }
    }
}
