//! The persisted preference set.
//!
//! One flat struct covering everything the core reads or writes:
//! - Locked-app set and tutorial flag
//! - Goal value/unit, deposit, control days, blocking window, trial end
//! - Today's movement counters, counter-source baseline, last reset date
//! - Health-platform opt-in and connected source name
//! - Emergency override flag and start time

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::{GoalConfig, GoalUnit};

/// All persisted preferences.
///
/// Serialized to/from TOML at `~/.config/stridelock/prefs.toml`. Every
/// field carries a serde default so files written by older versions keep
/// loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefs {
    /// Application identifiers subject to gating.
    #[serde(default)]
    pub locked_apps: BTreeSet<String>,
    /// Whether the onboarding tutorial has been completed.
    #[serde(default)]
    pub tutorial_completed: bool,

    #[serde(default = "default_goal_value")]
    pub goal_value: f64,
    #[serde(default)]
    pub goal_unit: GoalUnit,
    /// Commitment deposit; non-positive disables enforcement entirely.
    #[serde(default)]
    pub deposit: f64,
    /// Weekdays on which enforcement is active.
    #[serde(default = "default_control_days")]
    pub control_days: Vec<Weekday>,
    #[serde(default = "default_blocking_start")]
    pub blocking_start: NaiveTime,
    #[serde(default = "default_blocking_end")]
    pub blocking_end: NaiveTime,
    /// Last day of the enrollment trial (inclusive); no enforcement before then.
    #[serde(default)]
    pub trial_end_date: Option<NaiveDate>,

    #[serde(default)]
    pub steps_today: u64,
    #[serde(default)]
    pub distance_today_km: f64,
    /// Lifetime total captured on the first cumulative-counter reading of
    /// the day; today's count = total - baseline.
    #[serde(default)]
    pub sensor_baseline: Option<u64>,
    /// Persisted running counter for the detector/accelerometer branches.
    #[serde(default)]
    pub detector_steps: u64,
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
    /// Steps-per-kilometre constant used when the source supplies no distance.
    #[serde(default = "default_steps_per_km")]
    pub steps_per_km: u32,

    /// Whether the user opted in to the external health platform.
    #[serde(default)]
    pub health_opt_in: bool,
    /// Display name of the connected fitness source, if any.
    #[serde(default)]
    pub connected_source: Option<String>,

    #[serde(default)]
    pub emergency_active: bool,
    #[serde(default)]
    pub emergency_start: Option<DateTime<Utc>>,
}

fn default_goal_value() -> f64 {
    8000.0
}

fn default_control_days() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
}

fn default_blocking_start() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).unwrap()
}

fn default_blocking_end() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap()
}

fn default_steps_per_km() -> u32 {
    1300
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            locked_apps: BTreeSet::new(),
            tutorial_completed: false,
            goal_value: default_goal_value(),
            goal_unit: GoalUnit::default(),
            deposit: 0.0,
            control_days: default_control_days(),
            blocking_start: default_blocking_start(),
            blocking_end: default_blocking_end(),
            trial_end_date: None,
            steps_today: 0,
            distance_today_km: 0.0,
            sensor_baseline: None,
            detector_steps: 0,
            last_reset_date: None,
            steps_per_km: default_steps_per_km(),
            health_opt_in: false,
            connected_source: None,
            emergency_active: false,
            emergency_start: None,
        }
    }
}

impl Prefs {
    /// The goal configuration slice of the preferences, immutable for the
    /// duration of one decision evaluation.
    pub fn goal_config(&self) -> GoalConfig {
        GoalConfig {
            goal_value: self.goal_value,
            unit: self.goal_unit,
            control_days: self.control_days.clone(),
            blocking_start: self.blocking_start,
            blocking_end: self.blocking_end,
            trial_end_date: self.trial_end_date,
            deposit: self.deposit,
        }
    }
}
