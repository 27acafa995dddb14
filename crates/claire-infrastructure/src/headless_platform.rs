//! A browser platform without a browser.
//!
//! [`HeadlessPlatform`] keeps the state a real browser would (tabs, the badge,
//! notifications, which pages carry the detector) in memory and logs every
//! call. The CLI host runs the coordinator against it, and tests use it to
//! observe what the coordinator asked the browser to do.

use async_trait::async_trait;
use claire_core::error::{ClaireError, Result};
use claire_core::platform::{Badge, BrowserPlatform, Notification, TabId, TabInfo, WindowId};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One recorded call into the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    SetPanelBehavior(bool),
    InjectDetector(TabId),
    OpenSidePanel(WindowId),
    SetBadge(Badge),
    CreateNotification(String),
    ClearNotification(String),
}

#[derive(Default)]
struct HeadlessState {
    tabs: Vec<TabInfo>,
    active_tab: Option<TabId>,
    instrumented: HashSet<TabId>,
    failing_tabs: HashSet<TabId>,
    fail_open_panel: bool,
    panel_opens_on_action_click: bool,
    badge: Badge,
    notifications: BTreeMap<String, Notification>,
    calls: Vec<PlatformCall>,
}

pub struct HeadlessPlatform {
    version: String,
    state: Mutex<HeadlessState>,
}

impl HeadlessPlatform {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            state: Mutex::new(HeadlessState::default()),
        }
    }

    /// Opens a tab. The first tab opened becomes the active one.
    pub async fn add_tab(&self, tab: TabInfo) {
        let mut state = self.state.lock().await;
        if state.active_tab.is_none() {
            state.active_tab = Some(tab.id);
        }
        state.tabs.push(tab);
    }

    pub async fn set_active_tab(&self, tab_id: Option<TabId>) {
        self.state.lock().await.active_tab = tab_id;
    }

    /// Marks a tab as already carrying the detector.
    pub async fn mark_instrumented(&self, tab_id: TabId) {
        self.state.lock().await.instrumented.insert(tab_id);
    }

    /// Makes injection into `tab_id` fail, like a page that refuses scripting.
    pub async fn fail_injection(&self, tab_id: TabId) {
        self.state.lock().await.failing_tabs.insert(tab_id);
    }

    pub async fn fail_open_panel(&self, fail: bool) {
        self.state.lock().await.fail_open_panel = fail;
    }

    pub async fn is_instrumented(&self, tab_id: TabId) -> bool {
        self.state.lock().await.instrumented.contains(&tab_id)
    }

    pub async fn panel_opens_on_action_click(&self) -> bool {
        self.state.lock().await.panel_opens_on_action_click
    }

    pub async fn badge(&self) -> Badge {
        self.state.lock().await.badge.clone()
    }

    /// Live notifications keyed by id.
    pub async fn notifications(&self) -> BTreeMap<String, Notification> {
        self.state.lock().await.notifications.clone()
    }

    /// Windows whose side panel was opened, in call order.
    pub async fn opened_windows(&self) -> Vec<WindowId> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::OpenSidePanel(window_id) => Some(*window_id),
                _ => None,
            })
            .collect()
    }

    pub async fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl BrowserPlatform for HeadlessPlatform {
    async fn set_panel_opens_on_action_click(&self, enabled: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        state.panel_opens_on_action_click = enabled;
        state.calls.push(PlatformCall::SetPanelBehavior(enabled));
        debug!("[Platform] Panel opens on action click: {}", enabled);
        Ok(())
    }

    async fn query_tabs(&self) -> Result<Vec<TabInfo>> {
        Ok(self.state.lock().await.tabs.clone())
    }

    async fn active_tab(&self) -> Result<Option<TabInfo>> {
        let state = self.state.lock().await;
        Ok(state
            .active_tab
            .and_then(|id| state.tabs.iter().find(|tab| tab.id == id).cloned()))
    }

    async fn probe_detector(&self, tab_id: TabId) -> Result<bool> {
        Ok(self.state.lock().await.instrumented.contains(&tab_id))
    }

    async fn inject_detector(&self, tab_id: TabId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.calls.push(PlatformCall::InjectDetector(tab_id));
        if state.failing_tabs.contains(&tab_id) {
            return Err(ClaireError::platform(format!(
                "Cannot access contents of tab {}",
                tab_id
            )));
        }
        state.instrumented.insert(tab_id);
        info!("[Platform] Detector injected into tab {}", tab_id);
        Ok(())
    }

    async fn open_side_panel(&self, window_id: WindowId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.calls.push(PlatformCall::OpenSidePanel(window_id));
        if state.fail_open_panel {
            return Err(ClaireError::platform("Side panel is not available"));
        }
        info!("[Platform] Side panel opened in window {}", window_id);
        Ok(())
    }

    async fn set_badge(&self, badge: Badge) -> Result<()> {
        let mut state = self.state.lock().await;
        if badge.is_cleared() {
            debug!("[Platform] Badge cleared");
        } else {
            info!("[Platform] Badge set: {}", badge.text);
        }
        state.calls.push(PlatformCall::SetBadge(badge.clone()));
        state.badge = badge;
        Ok(())
    }

    async fn create_notification(&self, id: &str, notification: Notification) -> Result<()> {
        let mut state = self.state.lock().await;
        info!(
            "[Platform] Notification {}: {} - {}",
            id, notification.title, notification.message
        );
        state
            .calls
            .push(PlatformCall::CreateNotification(id.to_string()));
        state.notifications.insert(id.to_string(), notification);
        Ok(())
    }

    async fn clear_notification(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(PlatformCall::ClearNotification(id.to_string()));
        state.notifications.remove(id);
        Ok(())
    }

    fn extension_version(&self) -> String {
        self.version.clone()
    }
}
