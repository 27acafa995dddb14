//! Inactivity monitor.
//!
//! ACTIVE → IDLE after `inactivity_threshold_ms` without activity, checked
//! every `poll_interval_ms`. Going idle sets the badge, raises one
//! notification and re-arms the timer, so each idle period notifies once.

use super::Coordinator;
use claire_core::error::Result;
use claire_core::model::ActivityState;
use claire_core::platform::{Badge, Notification};
use claire_core::store::{KvStoreExt, StorageKey};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

/// Notification ids raised by the monitor start with this.
pub const INACTIVITY_NOTIFICATION_PREFIX: &str = "claire-inactive-";

const IDLE_BADGE_TEXT: &str = "👋";
const IDLE_BADGE_COLOR: &str = "#667eea";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    Active,
    /// Notified; stays here until the next activity.
    Idle,
}

/// What a single monitor check did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No activity was recorded yet; now it is.
    Seeded,
    Active,
    Notified(String),
}

fn inactivity_notification() -> Notification {
    Notification {
        title: "Claire AI".to_string(),
        message: "Still there? I'm ready to assist you! 👋".to_string(),
        icon_path: "icons/icon128.png".to_string(),
        require_interaction: false,
    }
}

impl Coordinator {
    /// Runs one inactivity check.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let now = self.clock.now_millis();
        let Some(last) = self
            .store
            .get_value::<i64>(StorageKey::LastActivityTime)
            .await?
        else {
            self.store
                .set_value(StorageKey::LastActivityTime, &now)
                .await?;
            return Ok(TickOutcome::Seeded);
        };

        if !ActivityState::at(last).is_idle(now, self.timing.inactivity_threshold_ms) {
            return Ok(TickOutcome::Active);
        }

        self.platform
            .set_badge(Badge::with_color(IDLE_BADGE_TEXT, IDLE_BADGE_COLOR))
            .await?;
        let notification_id = format!("{}{}", INACTIVITY_NOTIFICATION_PREFIX, now);
        self.platform
            .create_notification(&notification_id, inactivity_notification())
            .await?;
        self.store
            .set_value(StorageKey::LastActivityTime, &now)
            .await?;
        *self.phase.write().await = MonitorPhase::Idle;

        info!(
            "[Coordinator] User idle for {}ms, notified",
            ActivityState::at(last).elapsed_millis(now)
        );
        Ok(TickOutcome::Notified(notification_id))
    }

    /// Starts the polling task, replacing any running one.
    pub async fn start_monitoring(self: &Arc<Self>) {
        let mut monitor = self.monitor.lock().await;
        if let Some(previous) = monitor.take() {
            debug!("[Coordinator] Replacing running inactivity monitor");
            previous.abort();
        }

        let period = self.timing.poll_interval().max(Duration::from_millis(1));
        let coordinator = Arc::downgrade(self);
        *monitor = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(coordinator) = coordinator.upgrade() else {
                    break;
                };
                if let Err(e) = coordinator.tick().await {
                    warn!("[Coordinator] Inactivity check failed: {}", e);
                }
            }
        }));
        info!("[Coordinator] Inactivity monitor started ({:?} interval)", period);
    }

    pub async fn stop_monitoring(&self) {
        if let Some(handle) = self.monitor.lock().await.take() {
            handle.abort();
        }
    }

    pub async fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn phase(&self) -> MonitorPhase {
        *self.phase.read().await
    }

    /// Records activity now: clears the badge and returns to ACTIVE.
    pub(super) async fn reset_activity(&self) -> Result<()> {
        self.store
            .set_value(StorageKey::LastActivityTime, &self.clock.now_millis())
            .await?;
        self.platform.set_badge(Badge::cleared()).await?;
        *self.phase.write().await = MonitorPhase::Active;
        Ok(())
    }
}
