//! Background coordinator.
//!
//! The one long-lived context. It owns extension lifecycle handling, the
//! toolbar badge, notifications and the inactivity monitor, and answers the
//! request/response protocol spoken by pages and the panel.
//!
//! # Module Structure
//!
//! - `inactivity`: the ACTIVE/IDLE monitor and its polling task
//! - `injection`: instrumenting already-open tabs with the detector

mod inactivity;
mod injection;

pub use inactivity::{INACTIVITY_NOTIFICATION_PREFIX, MonitorPhase, TickOutcome};
pub use injection::InjectionReport;

use async_trait::async_trait;
use claire_core::clock::Clock;
use claire_core::config::TimingConfig;
use claire_core::error::{ClaireError, Result};
use claire_core::platform::{Badge, BrowserPlatform, TabInfo};
use claire_core::protocol::{
    Broadcast, BroadcastBus, MessageSender, OpenClaireRequest, Request, Response, RuntimeChannel,
    SelectionUpdate,
};
use claire_core::store::{KvStore, SELECTION_KEYS, StorageKey};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Keyboard command that opens the panel.
pub const TOGGLE_COMMAND: &str = "toggle-claire";

/// Why the extension was (re)installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    Install,
    Update,
    /// Browser or shared-module updates; nothing to do.
    Other,
}

pub struct Coordinator {
    platform: Arc<dyn BrowserPlatform>,
    store: Arc<dyn KvStore>,
    bus: BroadcastBus,
    clock: Arc<dyn Clock>,
    timing: TimingConfig,
    phase: RwLock<MonitorPhase>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(
        platform: Arc<dyn BrowserPlatform>,
        store: Arc<dyn KvStore>,
        bus: BroadcastBus,
        clock: Arc<dyn Clock>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            platform,
            store,
            bus,
            clock,
            timing,
            phase: RwLock::new(MonitorPhase::Active),
            monitor: Mutex::new(None),
        }
    }

    pub async fn on_installed(self: &Arc<Self>, reason: InstallReason) -> Result<()> {
        match reason {
            InstallReason::Install => {
                info!("[Coordinator] Installed");
                self.store
                    .set(vec![
                        (StorageKey::Enabled, Value::Bool(true)),
                        (StorageKey::FirstRun, Value::Bool(true)),
                        (StorageKey::LastActivityTime, json!(self.clock.now_millis())),
                    ])
                    .await?;
            }
            InstallReason::Update => {
                info!(
                    "[Coordinator] Updated to version {}",
                    self.platform.extension_version()
                );
            }
            InstallReason::Other => {
                debug!("[Coordinator] Ignoring install event");
                return Ok(());
            }
        }

        self.platform.set_panel_opens_on_action_click(true).await?;
        self.inject_detectors().await;
        self.start_monitoring().await;
        Ok(())
    }

    pub async fn on_startup(self: &Arc<Self>) -> Result<()> {
        info!("[Coordinator] Started");
        self.platform.set_panel_opens_on_action_click(true).await?;
        self.start_monitoring().await;
        Ok(())
    }

    /// Answers one protocol request. Every request gets exactly one response.
    pub async fn handle(&self, request: Request, sender: &MessageSender) -> Response {
        debug!(
            "[Coordinator] {} from tab {:?}",
            request.kind(),
            sender.tab.as_ref().map(|tab| tab.id)
        );
        match request {
            Request::UserActivity => match self.reset_activity().await {
                Ok(()) => Response::ok(),
                Err(e) => Response::failure(e.to_string()),
            },
            Request::OpenClaire(open) => match self.open_claire(open, sender).await {
                Ok(()) => Response::ok(),
                Err(e) => {
                    warn!("[Coordinator] Failed to open Claire: {}", e);
                    Response::failure(e.to_string())
                }
            },
            Request::CloseSidePanel => Response::ok_with_message("Use X button to close"),
            Request::Ping => Response::pong(Some(self.platform.extension_version())),
        }
    }

    /// Toolbar icon clicked on `tab`.
    pub async fn on_action_clicked(&self, tab: &TabInfo) -> Result<()> {
        let window_id = tab.window_id.ok_or(ClaireError::NoWindowContext)?;
        self.platform.open_side_panel(window_id).await?;
        self.reset_activity().await
    }

    /// Keyboard command. Only [`TOGGLE_COMMAND`] does anything.
    pub async fn on_command(&self, command: &str) -> Result<()> {
        if command != TOGGLE_COMMAND {
            debug!("[Coordinator] Ignoring command {}", command);
            return Ok(());
        }
        let Some(window_id) = self.active_window().await? else {
            debug!("[Coordinator] No active tab for {}", command);
            return Ok(());
        };
        self.platform.open_side_panel(window_id).await?;
        self.reset_activity().await
    }

    /// Side panel closed: the next mount starts a fresh conversation.
    pub async fn on_panel_closed(&self) -> Result<()> {
        info!("[Coordinator] Panel closed, resetting conversation");
        let mut keys = vec![StorageKey::ChatHistory];
        keys.extend(SELECTION_KEYS);
        self.store.remove(&keys).await?;
        self.store
            .set(vec![(StorageKey::ForceNewConversation, Value::Bool(true))])
            .await
    }

    pub async fn on_notification_clicked(&self, notification_id: &str) -> Result<()> {
        if !notification_id.starts_with(INACTIVITY_NOTIFICATION_PREFIX) {
            return Ok(());
        }
        let Some(window_id) = self.active_window().await? else {
            debug!("[Coordinator] No active tab for notification click");
            return Ok(());
        };
        self.platform.open_side_panel(window_id).await?;
        self.platform.clear_notification(notification_id).await?;
        self.reset_activity().await
    }

    pub fn bus(&self) -> &BroadcastBus {
        &self.bus
    }

    async fn open_claire(&self, open: OpenClaireRequest, sender: &MessageSender) -> Result<()> {
        let window_id = sender.window_id().ok_or(ClaireError::NoWindowContext)?;
        debug!(
            "[Coordinator] Storing selection of {} chars",
            open.text.chars().count()
        );

        self.store
            .set(vec![
                (StorageKey::SelectedText, json!(open.text)),
                (
                    StorageKey::SelectedTextUrl,
                    json!(open.url.clone().unwrap_or_default()),
                ),
                (
                    StorageKey::SelectedTextPageTitle,
                    json!(open.page_title.clone().unwrap_or_default()),
                ),
                (StorageKey::Context, json!(open.context.unwrap_or_default())),
                (StorageKey::Timestamp, json!(self.clock.now_millis())),
            ])
            .await?;

        // An open panel picks this up live; a closed one reads the store on mount.
        let delivered = self
            .bus
            .publish(Broadcast::UpdateSelectedText(SelectionUpdate {
                text: open.text,
                url: open.url,
                page_title: open.page_title,
            }));
        debug!("[Coordinator] Selection broadcast to {} listeners", delivered);

        self.platform.open_side_panel(window_id).await
    }

    async fn active_window(&self) -> Result<Option<i64>> {
        Ok(self
            .platform
            .active_tab()
            .await?
            .and_then(|tab| tab.window_id))
    }
}

/// Runtime channel for one sender, answered in-process by a [`Coordinator`].
pub struct CoordinatorChannel {
    coordinator: Arc<Coordinator>,
    sender: MessageSender,
}

impl CoordinatorChannel {
    pub fn new(coordinator: Arc<Coordinator>, sender: MessageSender) -> Self {
        Self {
            coordinator,
            sender,
        }
    }
}

#[async_trait]
impl RuntimeChannel for CoordinatorChannel {
    async fn send(&self, request: Request) -> Result<Response> {
        Ok(self.coordinator.handle(request, &self.sender).await)
    }
}
