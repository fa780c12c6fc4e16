//! Access gating.
//!
//! The decision engine evaluates every forwarded foreground package against
//! the locked-app set, goal progress, enforcement schedule, and emergency
//! override, producing an ephemeral [`BlockDecision`] per event. Side
//! effects for blocks (notice, haptic, analytics, navigation) are debounced
//! to once per rolling one-second window; the evaluation itself is a pure
//! function apart from the debounce timestamp and the emergency flag.

mod decision;
mod effects;
mod emergency;
mod engine;

pub use decision::{decide, BlockDecision, BlockReason, DecisionInputs, EvalClock, NoticeAction, Verdict};
pub use effects::{Haptics, Navigator, NoopHaptics, NoopNavigator, NoopNotifier, Notifier};
pub use emergency::{EmergencyState, EMERGENCY_WINDOW_SECS};
pub use engine::{BlockNotice, GateEngine};
