//! Side-effect collaborators for block decisions.
//!
//! Platform shells implement these; the core ships no-op defaults so every
//! seam is optional. Analytics lives in [`crate::analytics`] because it has
//! a real local implementation.

use super::engine::BlockNotice;

/// Notification side channel.
pub trait Notifier: Send + Sync {
    /// Show or refresh the blocking notice with progress, goal, remaining,
    /// and estimated arrival in the active unit.
    fn show_block_notice(&self, _notice: &BlockNotice) {}

    /// Show or update the persistent emergency countdown.
    fn show_emergency_countdown(&self, _remaining_secs: u64) {}

    fn cancel_emergency_countdown(&self) {}
}

/// Haptic feedback on a block.
pub trait Haptics: Send + Sync {
    fn pulse(&self) {}
}

/// Forces the foreground back to the home surface.
pub trait Navigator: Send + Sync {
    fn go_home(&self) {}
}

pub struct NoopNotifier;
impl Notifier for NoopNotifier {}

pub struct NoopHaptics;
impl Haptics for NoopHaptics {}

pub struct NoopNavigator;
impl Navigator for NoopNavigator {}
