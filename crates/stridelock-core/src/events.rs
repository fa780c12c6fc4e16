use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::gate::BlockReason;
use crate::movement::SourceKind;

/// Every state change in the system produces an Event.
/// The GUI polls for events; the CLI and analytics consume them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A movement source was selected at session start.
    SourceSelected {
        kind: SourceKind,
        at: DateTime<Utc>,
    },
    /// The active source failed and the manager demoted to the next one.
    SourceFallback {
        from: SourceKind,
        to: SourceKind,
        reason: String,
        at: DateTime<Utc>,
    },
    StepsUpdated {
        steps_today: u64,
        at: DateTime<Utc>,
    },
    DistanceUpdated {
        distance_km: f64,
        at: DateTime<Utc>,
    },
    /// Local-day rollover: counters zeroed, baseline cleared.
    DailyReset {
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    AppBlocked {
        package: String,
        reason: BlockReason,
        at: DateTime<Utc>,
    },
    EmergencyStarted {
        at: DateTime<Utc>,
    },
    /// The 15-minute override window ran out during an evaluation.
    EmergencyExpired {
        at: DateTime<Utc>,
    },
    EmergencyCancelled {
        at: DateTime<Utc>,
    },
}

/// Bounded in-memory event queue; oldest entries drop first.
#[derive(Default)]
pub struct EventQueue {
    inner: Mutex<VecDeque<Event>>,
}

/// Queue capacity shared by all producers.
const QUEUE_CAP: usize = 256;

impl EventQueue {
    pub fn push(&self, event: Event) {
        let mut queue = self.inner.lock().unwrap();
        if queue.len() == QUEUE_CAP {
            queue.pop_front();
        }
        queue.push_back(event);
    }

    /// Drain everything queued so far (polling consumers).
    pub fn drain(&self) -> Vec<Event> {
        self.inner.lock().unwrap().drain(..).collect()
    }
}
