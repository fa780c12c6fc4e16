//! The pure decision function.
//!
//! Ordered, first-match-wins checks over a snapshot of inputs. The only
//! state it "mutates" is returned in the verdict: the emergency flag flips
//! to inactive when the window has run out, and a notice action tells the
//! engine what to do with the countdown notification.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::GoalConfig;

use super::emergency::EmergencyState;

/// Why a package was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockReason {
    /// Tutorial mode: only the progress-vs-goal check applies, and it failed.
    TutorialGoalNotMet,
    /// Inside an enforced window with the goal unmet and no override.
    GoalNotMet,
    /// The 15-minute override window ran out.
    EmergencyExpired,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BlockReason::TutorialGoalNotMet => "tutorial-goal-not-met",
            BlockReason::GoalNotMet => "goal-not-met",
            BlockReason::EmergencyExpired => "emergency-expired",
        };
        write!(f, "{name}")
    }
}

/// Outcome of one evaluation; recomputed per event, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum BlockDecision {
    Allowed,
    Blocked(BlockReason),
    /// Override window running; not a block.
    EmergencyActive { remaining_secs: u64 },
}

/// What the engine should do with the emergency countdown notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAction {
    None,
    ShowCountdown { remaining_secs: u64 },
    CancelCountdown,
}

/// Evaluation timestamp, split into the instant and its local-calendar
/// parts so tests can pin any wall-clock situation.
#[derive(Debug, Clone, Copy)]
pub struct EvalClock {
    pub now: DateTime<Utc>,
    pub local_date: NaiveDate,
    pub local_time: NaiveTime,
}

impl EvalClock {
    pub fn current() -> Self {
        let local = Local::now();
        Self {
            now: local.with_timezone(&Utc),
            local_date: local.date_naive(),
            local_time: local.time(),
        }
    }

    pub fn at(now: DateTime<Utc>, local_date: NaiveDate, local_time: NaiveTime) -> Self {
        Self {
            now,
            local_date,
            local_time,
        }
    }

    pub fn weekday(&self) -> Weekday {
        self.local_date.weekday()
    }

    /// Sanity accessor used by hosts logging decisions.
    pub fn local_hour(&self) -> u32 {
        self.local_time.hour()
    }
}

/// Snapshot of everything one evaluation reads.
#[derive(Debug, Clone)]
pub struct DecisionInputs<'a> {
    pub package: &'a str,
    pub locked_apps: &'a BTreeSet<String>,
    pub tutorial_completed: bool,
    pub steps_today: u64,
    pub distance_today_km: f64,
    pub config: &'a GoalConfig,
    pub emergency: EmergencyState,
}

/// The decision plus the (possibly expired) emergency state and the notice
/// action to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub decision: BlockDecision,
    pub emergency: EmergencyState,
    pub notice: NoticeAction,
}

impl Verdict {
    fn allowed(emergency: EmergencyState) -> Self {
        Self {
            decision: BlockDecision::Allowed,
            emergency,
            notice: NoticeAction::None,
        }
    }
}

/// Ordered, first-match-wins evaluation.
pub fn decide(inputs: &DecisionInputs<'_>, clock: &EvalClock) -> Verdict {
    let config = inputs.config;
    let emergency = inputs.emergency;
    let goal_met = config.goal_met(inputs.steps_today, inputs.distance_today_km);

    // 1. Not a locked app.
    if !inputs.locked_apps.contains(inputs.package) {
        return Verdict::allowed(emergency);
    }

    // 2. Tutorial mode bypasses every later rule: only progress counts.
    if !inputs.tutorial_completed {
        return Verdict {
            decision: if goal_met {
                BlockDecision::Allowed
            } else {
                BlockDecision::Blocked(BlockReason::TutorialGoalNotMet)
            },
            emergency,
            notice: NoticeAction::None,
        };
    }

    // 3. No deposit, no enforcement.
    if config.deposit <= 0.0 {
        return Verdict::allowed(emergency);
    }

    // 4. Not a control day.
    if !config.is_control_day(clock.weekday()) {
        return Verdict::allowed(emergency);
    }

    // 5. Trial period still running.
    if config.in_trial(clock.local_date) {
        return Verdict::allowed(emergency);
    }

    // 6. Outside the blocking window.
    if !config.in_blocking_window(clock.local_time) {
        return Verdict::allowed(emergency);
    }

    // 7. Goal reached: allow, and take down any pending countdown notice.
    if goal_met {
        return Verdict {
            decision: BlockDecision::Allowed,
            emergency,
            notice: NoticeAction::CancelCountdown,
        };
    }

    // 8. Emergency sub-state.
    if emergency.active {
        if emergency.expired(clock.now) {
            return Verdict {
                decision: BlockDecision::Blocked(BlockReason::EmergencyExpired),
                emergency: EmergencyState::inactive(),
                notice: NoticeAction::CancelCountdown,
            };
        }
        let remaining_secs = emergency.remaining_secs(clock.now);
        return Verdict {
            decision: BlockDecision::EmergencyActive { remaining_secs },
            emergency,
            notice: NoticeAction::ShowCountdown { remaining_secs },
        };
    }

    Verdict {
        decision: BlockDecision::Blocked(BlockReason::GoalNotMet),
        emergency,
        notice: NoticeAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoalUnit;
    use chrono::Duration;

    fn locked() -> BTreeSet<String> {
        ["com.example.doom".to_string()].into_iter().collect()
    }

    fn config() -> GoalConfig {
        GoalConfig {
            goal_value: 8000.0,
            unit: GoalUnit::Steps,
            control_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ],
            blocking_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            blocking_end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            trial_end_date: None,
            deposit: 10.0,
        }
    }

    // A Monday, mid-window.
    fn clock() -> EvalClock {
        EvalClock::at(
            Utc::now(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        )
    }

    fn inputs<'a>(
        package: &'a str,
        locked_apps: &'a BTreeSet<String>,
        cfg: &'a GoalConfig,
        steps: u64,
    ) -> DecisionInputs<'a> {
        DecisionInputs {
            package,
            locked_apps,
            tutorial_completed: true,
            steps_today: steps,
            distance_today_km: 0.0,
            config: cfg,
            emergency: EmergencyState::inactive(),
        }
    }

    #[test]
    fn unlocked_package_always_allowed() {
        let apps = locked();
        let cfg = config();
        let mut i = inputs("com.other.app", &apps, &cfg, 0);
        // Even with an emergency mid-flight and zero progress.
        i.emergency = EmergencyState::activated_at(Utc::now());
        assert_eq!(decide(&i, &clock()).decision, BlockDecision::Allowed);
    }

    #[test]
    fn tutorial_mode_depends_only_on_progress() {
        let apps = locked();
        let mut cfg = config();
        // Everything that would otherwise allow: no deposit, trial running,
        // outside the window, not a control day.
        cfg.deposit = 0.0;
        cfg.trial_end_date = NaiveDate::from_ymd_opt(2030, 1, 1);
        cfg.control_days = vec![];
        cfg.blocking_start = NaiveTime::from_hms_opt(1, 0, 0).unwrap();
        cfg.blocking_end = NaiveTime::from_hms_opt(2, 0, 0).unwrap();

        let mut i = inputs("com.example.doom", &apps, &cfg, 7999);
        i.tutorial_completed = false;
        assert_eq!(
            decide(&i, &clock()).decision,
            BlockDecision::Blocked(BlockReason::TutorialGoalNotMet)
        );

        i.steps_today = 8000;
        assert_eq!(decide(&i, &clock()).decision, BlockDecision::Allowed);
    }

    #[test]
    fn zero_deposit_disables_enforcement() {
        let apps = locked();
        let mut cfg = config();
        cfg.deposit = 0.0;
        let i = inputs("com.example.doom", &apps, &cfg, 0);
        assert_eq!(decide(&i, &clock()).decision, BlockDecision::Allowed);
    }

    #[test]
    fn non_control_day_allowed() {
        let apps = locked();
        let mut cfg = config();
        cfg.control_days = vec![Weekday::Tue];
        let i = inputs("com.example.doom", &apps, &cfg, 0);
        assert_eq!(decide(&i, &clock()).decision, BlockDecision::Allowed);
    }

    #[test]
    fn trial_period_allowed() {
        let apps = locked();
        let mut cfg = config();
        cfg.trial_end_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        let i = inputs("com.example.doom", &apps, &cfg, 0);
        assert_eq!(decide(&i, &clock()).decision, BlockDecision::Allowed);
    }

    #[test]
    fn outside_window_allowed() {
        let apps = locked();
        let cfg = config();
        let i = inputs("com.example.doom", &apps, &cfg, 0);
        let night = EvalClock::at(
            Utc::now(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
        );
        assert_eq!(decide(&i, &night).decision, BlockDecision::Allowed);
    }

    #[test]
    fn goal_met_allows_and_cancels_countdown() {
        let apps = locked();
        let cfg = config();
        let i = inputs("com.example.doom", &apps, &cfg, 8000);
        let v = decide(&i, &clock());
        assert_eq!(v.decision, BlockDecision::Allowed);
        assert_eq!(v.notice, NoticeAction::CancelCountdown);
    }

    #[test]
    fn goal_unmet_blocks() {
        let apps = locked();
        let cfg = config();
        let i = inputs("com.example.doom", &apps, &cfg, 7000);
        assert_eq!(
            decide(&i, &clock()).decision,
            BlockDecision::Blocked(BlockReason::GoalNotMet)
        );
    }

    #[test]
    fn emergency_countdown_is_strictly_decreasing() {
        let apps = locked();
        let cfg = config();
        let t0 = Utc::now();
        let base = clock();

        let mut prev = 901;
        for elapsed in [0i64, 1, 60, 450, 899] {
            let mut i = inputs("com.example.doom", &apps, &cfg, 7000);
            i.emergency = EmergencyState::activated_at(t0);
            let at = EvalClock::at(
                t0 + Duration::seconds(elapsed),
                base.local_date,
                base.local_time,
            );
            let v = decide(&i, &at);
            match v.decision {
                BlockDecision::EmergencyActive { remaining_secs } => {
                    assert_eq!(remaining_secs, (900 - elapsed) as u64);
                    assert!(remaining_secs < prev);
                    prev = remaining_secs;
                    assert_eq!(
                        v.notice,
                        NoticeAction::ShowCountdown { remaining_secs }
                    );
                    assert!(v.emergency.active);
                }
                other => panic!("expected EmergencyActive, got {other:?}"),
            }
        }
    }

    #[test]
    fn emergency_expiry_flips_flag_and_blocks() {
        let apps = locked();
        let cfg = config();
        let t0 = Utc::now();
        let base = clock();

        let mut i = inputs("com.example.doom", &apps, &cfg, 7000);
        i.emergency = EmergencyState::activated_at(t0);
        let at = EvalClock::at(
            t0 + Duration::seconds(901),
            base.local_date,
            base.local_time,
        );
        let v = decide(&i, &at);
        assert_eq!(
            v.decision,
            BlockDecision::Blocked(BlockReason::EmergencyExpired)
        );
        assert!(!v.emergency.active);
        assert_eq!(v.notice, NoticeAction::CancelCountdown);
    }

    #[test]
    fn distance_goal_scenario() {
        let apps = locked();
        let mut cfg = config();
        cfg.unit = GoalUnit::Distance;
        cfg.goal_value = 5.0;

        let mut i = inputs("com.example.doom", &apps, &cfg, 0);
        i.distance_today_km = 5.2;
        assert_eq!(decide(&i, &clock()).decision, BlockDecision::Allowed);

        i.distance_today_km = 4.2;
        assert_eq!(
            decide(&i, &clock()).decision,
            BlockDecision::Blocked(BlockReason::GoalNotMet)
        );
    }
}
