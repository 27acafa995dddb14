//! Panel-local inactivity tracking.
//!
//! Independent of the coordinator's monitor: the panel keeps its own
//! last-activity instant to decide whether to show its inactivity notice.

use claire_core::clock::Clock;
use claire_core::model::ActivityState;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct PanelActivityTracker {
    clock: Arc<dyn Clock>,
    last_activity_millis: AtomicI64,
    threshold_millis: i64,
}

impl PanelActivityTracker {
    pub fn new(clock: Arc<dyn Clock>, threshold_millis: i64) -> Self {
        let now = clock.now_millis();
        Self {
            clock,
            last_activity_millis: AtomicI64::new(now),
            threshold_millis,
        }
    }

    /// Records an interaction now.
    pub fn touch(&self) {
        self.last_activity_millis
            .store(self.clock.now_millis(), Ordering::SeqCst);
    }

    pub fn state(&self) -> ActivityState {
        ActivityState::at(self.last_activity_millis.load(Ordering::SeqCst))
    }

    pub fn is_inactive(&self) -> bool {
        self.state()
            .is_idle(self.clock.now_millis(), self.threshold_millis)
    }
}
