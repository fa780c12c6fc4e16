//! Movement data acquisition.
//!
//! Produces "steps today" / "distance today" from a priority-ordered chain
//! of sources with automatic fallback:
//!
//! 1. External health platform (opt-in, polled)
//! 2. Cumulative hardware step counter (lifetime total + daily baseline)
//! 3. Discrete step-detector events
//! 4. Raw accelerometer peak detection
//! 5. None (counters frozen)

mod manager;
mod pedometer;
mod progress;
mod source;

pub use manager::{MovementListener, MovementManager};
pub use pedometer::StepPeakDetector;
pub use progress::ProgressState;
pub use source::{
    select_source, HealthApi, SensorReading, SourceCaps, SourceKind, StepSource, Subscription,
};
