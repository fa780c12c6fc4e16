//! Accelerometer-derived step detection.
//!
//! Threshold-crossing peak detector over the 3-axis acceleration magnitude.
//! A step is a rising-edge crossing of the threshold, with a refractory
//! period between detections to reject noise and double-counting.

/// Magnitude threshold for a step peak, in sensor units (m/s^2-ish).
const STEP_THRESHOLD: f64 = 11.0;

/// Minimum spacing between detected steps.
const REFRACTORY_MS: u64 = 400;

/// Wall-clock-free peak detector; the caller supplies sample timestamps.
#[derive(Debug, Clone)]
pub struct StepPeakDetector {
    threshold: f64,
    refractory_ms: u64,
    /// Whether the previous sample was already above the threshold.
    above: bool,
    last_step_ms: Option<u64>,
}

impl Default for StepPeakDetector {
    fn default() -> Self {
        Self {
            threshold: STEP_THRESHOLD,
            refractory_ms: REFRACTORY_MS,
            above: false,
            last_step_ms: None,
        }
    }
}

impl StepPeakDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one 3-axis sample. Returns `true` when a step is detected.
    pub fn on_sample(&mut self, x: f64, y: f64, z: f64, at_ms: u64) -> bool {
        let magnitude = (x * x + y * y + z * z).sqrt();

        if magnitude < self.threshold {
            self.above = false;
            return false;
        }

        // Still riding the same peak.
        if self.above {
            return false;
        }
        self.above = true;

        if let Some(last) = self.last_step_ms {
            if at_ms.saturating_sub(last) < self.refractory_ms {
                return false;
            }
        }
        self.last_step_ms = Some(at_ms);
        true
    }
}
