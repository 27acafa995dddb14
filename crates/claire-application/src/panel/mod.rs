//! The side panel: conversation controller, app-level flows and activity.

pub mod activity;
pub mod app;
pub mod compose;
pub mod controller;

pub use activity::PanelActivityTracker;
pub use app::{ClairePanel, PanelView, SwitchOutcome};
pub use controller::{PanelSessionController, PanelStatus, RejectReason, SendOutcome};

use std::sync::atomic::{AtomicBool, Ordering};

/// Holds a single-flight flag for as long as it lives.
pub(crate) struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    /// Sets `flag`, or returns `None` if it was already set.
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_guard_is_exclusive_and_releases() {
        let flag = AtomicBool::new(false);
        let guard = FlightGuard::try_acquire(&flag).unwrap();
        assert!(FlightGuard::try_acquire(&flag).is_none());
        drop(guard);
        assert!(!flag.load(Ordering::SeqCst));
        assert!(FlightGuard::try_acquire(&flag).is_some());
    }
}
