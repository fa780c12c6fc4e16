//! Foreground app monitoring.
//!
//! Receives the platform's window-focus-change stream and filters it down
//! to candidate package identifiers: no package, our own package, and a
//! fixed deny-list of shell/system surfaces are dropped. Every surviving
//! package goes to the gate engine undebounced; debouncing is the engine's
//! job.

use std::sync::Arc;

use crate::gate::{BlockDecision, GateEngine};

/// Shell and system packages that are never candidates for gating.
const SYSTEM_DENY_LIST: &[&str] = &[
    "com.android.systemui",
    "com.android.launcher",
    "com.android.launcher3",
    "com.google.android.apps.nexuslauncher",
    "com.android.settings",
    "com.android.intentresolver",
    "android",
];

/// Kind of focus-change event delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusKind {
    /// A window gained focus (the only kind that names a foreground app).
    WindowStateChanged,
    /// Window list shuffled without a focus change.
    WindowsChanged,
    Other,
}

/// One focus-change event as delivered by the platform.
#[derive(Debug, Clone)]
pub struct FocusEvent {
    pub package: Option<String>,
    pub class: Option<String>,
    pub kind: FocusKind,
}

/// Filters focus events and forwards candidates to the gate engine.
pub struct ForegroundMonitor {
    own_package: String,
    engine: Arc<GateEngine>,
}

impl ForegroundMonitor {
    pub fn new(own_package: impl Into<String>, engine: Arc<GateEngine>) -> Self {
        Self {
            own_package: own_package.into(),
            engine,
        }
    }

    /// Platform callback entry point. Returns the decision when the event
    /// survived filtering, `None` when it was dropped.
    pub fn on_focus_event(&self, event: &FocusEvent) -> Option<BlockDecision> {
        if event.kind != FocusKind::WindowStateChanged {
            return None;
        }
        let package = event.package.as_deref()?;
        if package.is_empty()
            || package == self.own_package
            || SYSTEM_DENY_LIST.contains(&package)
        {
            return None;
        }
        Some(self.engine.on_app_focused(package))
    }
}
