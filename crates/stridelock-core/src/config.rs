//! Goal configuration and schedule membership checks.
//!
//! [`GoalConfig`] is the slice of the preference store the decision engine
//! reads: goal value/unit, control days, blocking window, trial period, and
//! deposit. It is cloned out of the store once per evaluation and treated
//! as immutable for that evaluation.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Unit the daily goal is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalUnit {
    #[default]
    Steps,
    Distance,
}

impl std::fmt::Display for GoalUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalUnit::Steps => write!(f, "steps"),
            GoalUnit::Distance => write!(f, "km"),
        }
    }
}

/// Enforcement configuration, immutable per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalConfig {
    pub goal_value: f64,
    pub unit: GoalUnit,
    /// Weekdays on which enforcement is active.
    pub control_days: Vec<Weekday>,
    pub blocking_start: NaiveTime,
    pub blocking_end: NaiveTime,
    /// Last day of the enrollment trial (inclusive).
    pub trial_end_date: Option<NaiveDate>,
    /// Non-positive deposit disables enforcement entirely.
    pub deposit: f64,
}

impl GoalConfig {
    pub fn is_control_day(&self, day: Weekday) -> bool {
        self.control_days.contains(&day)
    }

    /// Whether `time` falls inside the blocking window.
    ///
    /// A window whose start is after its end wraps overnight
    /// (e.g. 21:00 - 09:00).
    pub fn in_blocking_window(&self, time: NaiveTime) -> bool {
        if self.blocking_start > self.blocking_end {
            time >= self.blocking_start || time < self.blocking_end
        } else {
            time >= self.blocking_start && time <= self.blocking_end
        }
    }

    /// Whether `date` is still inside the enrollment trial.
    pub fn in_trial(&self, date: NaiveDate) -> bool {
        self.trial_end_date.is_some_and(|end| date <= end)
    }

    /// Today's progress in the configured unit.
    pub fn progress_value(&self, steps: u64, distance_km: f64) -> f64 {
        match self.unit {
            GoalUnit::Steps => steps as f64,
            GoalUnit::Distance => distance_km,
        }
    }

    pub fn goal_met(&self, steps: u64, distance_km: f64) -> bool {
        self.progress_value(steps, distance_km) >= self.goal_value
    }
}
