//! Movement source selection and the capability seam.
//!
//! Platform sensor APIs sit behind the [`StepSource`] and [`HealthApi`]
//! traits; the core never talks to hardware directly. Source priority is a
//! pure function over a capability snapshot so it can be tested without any
//! hardware present.

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// Which movement source is (or would be) driving the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// External health platform, polled for daily aggregates.
    HealthPlatform,
    /// Cumulative hardware counter reporting a lifetime total since boot.
    Counter,
    /// Discrete hardware step-detector events.
    Detector,
    /// Raw accelerometer samples run through a peak detector.
    Accelerometer,
    /// No source available; counters are frozen.
    None,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceKind::HealthPlatform => "health-platform",
            SourceKind::Counter => "counter",
            SourceKind::Detector => "detector",
            SourceKind::Accelerometer => "accelerometer",
            SourceKind::None => "none",
        };
        write!(f, "{name}")
    }
}

impl SourceKind {
    /// Priority order evaluated top-down at session start.
    pub const PRIORITY: [SourceKind; 4] = [
        SourceKind::HealthPlatform,
        SourceKind::Counter,
        SourceKind::Detector,
        SourceKind::Accelerometer,
    ];

    /// The next source to try after this one fails.
    pub fn next_fallback(self) -> SourceKind {
        match self {
            SourceKind::HealthPlatform => SourceKind::Counter,
            SourceKind::Counter => SourceKind::Detector,
            SourceKind::Detector => SourceKind::Accelerometer,
            SourceKind::Accelerometer | SourceKind::None => SourceKind::None,
        }
    }
}

/// Availability snapshot, decoupled from the hardware checks themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceCaps {
    pub health_available: bool,
    pub counter: bool,
    pub detector: bool,
    pub accelerometer: bool,
}

impl SourceCaps {
    pub fn has(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::HealthPlatform => self.health_available,
            SourceKind::Counter => self.counter,
            SourceKind::Detector => self.detector,
            SourceKind::Accelerometer => self.accelerometer,
            SourceKind::None => true,
        }
    }
}

/// Pick the highest-priority usable source.
///
/// The health platform is only eligible when the user has opted in *and*
/// the platform reports available; hardware sources only need to exist.
pub fn select_source(caps: &SourceCaps, health_opt_in: bool) -> SourceKind {
    for kind in SourceKind::PRIORITY {
        let eligible = match kind {
            SourceKind::HealthPlatform => health_opt_in && caps.health_available,
            _ => caps.has(kind),
        };
        if eligible {
            return kind;
        }
    }
    SourceKind::None
}

/// A reading pushed by a hardware source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    /// Lifetime step total since device boot (cumulative counter).
    CounterTotal(u64),
    /// One detected step (step-detector hardware).
    StepDetected,
    /// Raw 3-axis acceleration sample, with the sample timestamp in
    /// milliseconds since the epoch.
    Accel { x: f64, y: f64, z: f64, at_ms: u64 },
}

/// RAII listener registration; dropping it unregisters the listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn noop() -> Self {
        Self { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// One hardware movement source.
///
/// Readings arrive on the platform's sensor-service thread; the sink must
/// never block beyond a fast, bounded preference-store write.
pub trait StepSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Whether the hardware is present and permitted right now.
    fn is_available(&self) -> bool;

    /// Register for readings. Registration failures (permission denial,
    /// absent hardware) are returned, never panicked, so the manager can
    /// demote to the next source.
    fn subscribe(
        &self,
        sink: Box<dyn FnMut(SensorReading) + Send>,
    ) -> Result<Subscription, SensorError>;
}

/// External health platform, queried for daily aggregates.
///
/// No push events exist for this branch; the manager polls on a fixed
/// interval instead.
pub trait HealthApi: Send + Sync {
    fn is_available(&self) -> bool;

    fn steps_today(&self) -> Result<u64, SensorError>;

    fn distance_today_km(&self) -> Result<f64, SensorError>;
}
