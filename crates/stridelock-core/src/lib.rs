//! # StrideLock Core Library
//!
//! This library provides the core business logic for StrideLock, which ties
//! a user's permission to open configured "distracting" applications to
//! progress toward a daily movement goal (step count or distance). All
//! operations are available via a standalone CLI binary; platform shells
//! (mobile accessibility service, widget, GUI) are thin layers over the
//! same core library.
//!
//! ## Architecture
//!
//! - **Movement Manager**: Produces "steps today" / "distance today" from a
//!   priority-ordered chain of hardware and platform sources with automatic
//!   fallback on failure
//! - **Gate Engine**: Evaluates every foreground app change against the
//!   locked-app set, daily goal, schedule, and emergency override state
//! - **Storage**: TOML-based preference store and SQLite block-event log
//! - **Foreground Monitor**: Filters the platform's window-focus event
//!   stream down to candidate package identifiers
//!
//! ## Key Components
//!
//! - [`MovementManager`]: Source selection, fallback, and daily counters
//! - [`GateEngine`]: Block/allow decision loop with debounced side effects
//! - [`PrefStore`]: Read/write contract for persisted preferences
//! - [`EventLog`]: Local analytics for blocked-app events

pub mod analytics;
pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod monitor;
pub mod movement;
pub mod reset;
pub mod store;

pub use analytics::{Analytics, BlockEvent, DailySummary, EventLog};
pub use config::{GoalConfig, GoalUnit};
pub use error::{CoreError, DatabaseError, SensorError, StoreError};
pub use events::Event;
pub use gate::{
    BlockDecision, BlockNotice, BlockReason, EmergencyState, EvalClock, GateEngine, Haptics,
    Navigator, Notifier, EMERGENCY_WINDOW_SECS,
};
pub use monitor::{FocusEvent, FocusKind, ForegroundMonitor};
pub use movement::{
    HealthApi, MovementListener, MovementManager, ProgressState, SensorReading, SourceCaps,
    SourceKind, StepSource, Subscription,
};
pub use store::{MemoryPrefStore, PrefStore, Prefs, TomlPrefStore};
