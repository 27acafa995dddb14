//! User activity timestamp.

use serde::{Deserialize, Serialize};

/// Time of the last observed user interaction.
///
/// Single scalar, last writer wins; any context may overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityState {
    pub last_activity_time_millis: i64,
}

impl ActivityState {
    pub fn at(millis: i64) -> Self {
        Self {
            last_activity_time_millis: millis,
        }
    }

    pub fn elapsed_millis(&self, now_millis: i64) -> i64 {
        now_millis - self.last_activity_time_millis
    }

    /// Whether `threshold_millis` have passed without activity.
    pub fn is_idle(&self, now_millis: i64, threshold_millis: i64) -> bool {
        self.elapsed_millis(now_millis) >= threshold_millis
    }
}
