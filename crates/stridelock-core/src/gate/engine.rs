//! Stateful gate engine.
//!
//! Wraps the pure decision function with everything that touches the world:
//! preference loads, the emergency-expiry write-back, debounced block side
//! effects, and the fail-open boundary. Focus callbacks can arrive on
//! overlapping platform threads, so one mutex serializes evaluation of the
//! engine-owned mutable state (debounce timestamp; the emergency flag lives
//! in the store but is flipped under the same guard).

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{Analytics, BlockEvent};
use crate::config::{GoalConfig, GoalUnit};
use crate::error::CoreError;
use crate::events::{Event, EventQueue};
use crate::movement::MovementManager;
use crate::store::PrefStore;

use super::decision::{decide, BlockDecision, BlockReason, DecisionInputs, EvalClock, NoticeAction};
use super::effects::{Haptics, Navigator, NoopHaptics, NoopNavigator, NoopNotifier, Notifier};
use super::emergency::EmergencyState;

/// Block side effects fire at most once per this rolling window, across
/// packages, to survive rapid refocus churn.
const BLOCK_EFFECT_DEBOUNCE_MS: i64 = 1000;

/// Typical walking cadence used for the estimated-arrival figure.
const AVG_CADENCE_STEPS_PER_MIN: f64 = 100.0;

/// Typical walking speed used for distance-unit arrival estimates.
const AVG_WALK_KMH: f64 = 5.0;

/// Everything the blocking notice displays, in the user's chosen unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockNotice {
    pub package: String,
    pub unit: GoalUnit,
    pub progress: f64,
    pub goal: f64,
    pub remaining: f64,
    /// Estimated minutes of walking left to reach the goal.
    pub eta_minutes: u64,
}

impl BlockNotice {
    fn compute(package: &str, config: &GoalConfig, steps: u64, distance_km: f64) -> Self {
        let progress = config.progress_value(steps, distance_km);
        let remaining = (config.goal_value - progress).max(0.0);
        let eta_minutes = match config.unit {
            GoalUnit::Steps => remaining / AVG_CADENCE_STEPS_PER_MIN,
            GoalUnit::Distance => remaining / AVG_WALK_KMH * 60.0,
        }
        .ceil() as u64;
        Self {
            package: package.to_string(),
            unit: config.unit,
            progress,
            goal: config.goal_value,
            remaining,
            eta_minutes,
        }
    }
}

struct EngineState {
    last_block_effects: Option<DateTime<Utc>>,
}

/// Per-event access decision loop.
pub struct GateEngine {
    store: Arc<dyn PrefStore>,
    movement: Arc<MovementManager>,
    notifier: Arc<dyn Notifier>,
    haptics: Arc<dyn Haptics>,
    analytics: Option<Arc<dyn Analytics>>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<EngineState>,
    events: EventQueue,
}

impl GateEngine {
    pub fn new(store: Arc<dyn PrefStore>, movement: Arc<MovementManager>) -> Self {
        Self {
            store,
            movement,
            notifier: Arc::new(NoopNotifier),
            haptics: Arc::new(NoopHaptics),
            analytics: None,
            navigator: Arc::new(NoopNavigator),
            state: Mutex::new(EngineState {
                last_block_effects: None,
            }),
            events: EventQueue::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_haptics(mut self, haptics: Arc<dyn Haptics>) -> Self {
        self.haptics = haptics;
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn Analytics>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Event-callback boundary.
    ///
    /// No failure in here may reach the host process: a defect in gating
    /// logic must never permanently lock the user out of their device, so
    /// errors and panics both degrade to Allowed.
    pub fn on_app_focused(&self, package: &str) -> BlockDecision {
        let clock = EvalClock::current();
        match catch_unwind(AssertUnwindSafe(|| self.evaluate(package, &clock))) {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => {
                eprintln!("Warning: gate evaluation failed, allowing {package}: {e}");
                BlockDecision::Allowed
            }
            Err(_) => {
                eprintln!("Warning: gate evaluation panicked, allowing {package}");
                BlockDecision::Allowed
            }
        }
    }

    /// One full evaluation at an explicit clock (tests pin the clock).
    pub fn evaluate(&self, package: &str, clock: &EvalClock) -> Result<BlockDecision, CoreError> {
        let mut state = self.lock_state();

        if self.movement.check_daily_rollover(clock.local_date) {
            self.notifier.cancel_emergency_countdown();
        }

        let prefs = self.store.load()?;
        let progress = self.movement.progress();
        let config = prefs.goal_config();
        let emergency = EmergencyState::from_prefs(&prefs);

        let verdict = decide(
            &DecisionInputs {
                package,
                locked_apps: &prefs.locked_apps,
                tutorial_completed: prefs.tutorial_completed,
                steps_today: progress.steps_today,
                distance_today_km: progress.distance_today_km,
                config: &config,
                emergency,
            },
            clock,
        );

        match verdict.notice {
            NoticeAction::ShowCountdown { remaining_secs } => {
                self.notifier.show_emergency_countdown(remaining_secs);
            }
            NoticeAction::CancelCountdown => self.notifier.cancel_emergency_countdown(),
            NoticeAction::None => {}
        }

        if verdict.emergency.active != emergency.active {
            let mut updated = prefs.clone();
            verdict.emergency.write_prefs(&mut updated);
            self.store.save(&updated)?;
            self.events.push(Event::EmergencyExpired { at: clock.now });
        }

        if let BlockDecision::Blocked(reason) = verdict.decision {
            self.fire_block_effects(
                &mut state,
                package,
                reason,
                &config,
                progress.steps_today,
                progress.distance_today_km,
                clock,
            );
        }

        Ok(verdict.decision)
    }

    /// External "activate emergency" action (dialog, CLI, widget).
    pub fn activate_emergency(&self, now: DateTime<Utc>) -> Result<(), CoreError> {
        let _guard = self.lock_state();
        let mut prefs = self.store.load()?;
        EmergencyState::activated_at(now).write_prefs(&mut prefs);
        self.store.save(&prefs)?;
        self.events.push(Event::EmergencyStarted { at: now });
        Ok(())
    }

    /// External cancellation of a running override.
    pub fn cancel_emergency(&self) -> Result<(), CoreError> {
        let _guard = self.lock_state();
        let mut prefs = self.store.load()?;
        EmergencyState::inactive().write_prefs(&mut prefs);
        self.store.save(&prefs)?;
        self.notifier.cancel_emergency_countdown();
        self.events.push(Event::EmergencyCancelled { at: Utc::now() });
        Ok(())
    }

    /// Drain queued events (GUI/CLI polling).
    pub fn drain_events(&self) -> Vec<Event> {
        self.events.drain()
    }

    // A panic inside an evaluation poisons the mutex; recover the guard so
    // fail-open keeps working instead of panicking on every later event.
    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[allow(clippy::too_many_arguments)]
    fn fire_block_effects(
        &self,
        state: &mut EngineState,
        package: &str,
        reason: BlockReason,
        config: &GoalConfig,
        steps: u64,
        distance_km: f64,
        clock: &EvalClock,
    ) {
        if let Some(last) = state.last_block_effects {
            if (clock.now - last).num_milliseconds() < BLOCK_EFFECT_DEBOUNCE_MS {
                return;
            }
        }
        state.last_block_effects = Some(clock.now);

        if let Some(analytics) = &self.analytics {
            let event = BlockEvent {
                package: package.to_string(),
                reason,
                steps,
                distance_km,
                goal_value: config.goal_value,
                unit: config.unit,
                at: clock.now,
            };
            // Fire-and-forget: analytics failure never affects gating.
            if let Err(e) = analytics.record_block(&event) {
                eprintln!("Warning: failed to record block event: {e}");
            }
        }

        self.haptics.pulse();
        self.notifier
            .show_block_notice(&BlockNotice::compute(package, config, steps, distance_km));
        self.navigator.go_home();
        self.events.push(Event::AppBlocked {
            package: package.to_string(),
            reason,
            at: clock.now,
        });
    }
}
