//! Browser platform interfaces.
//!
//! [`BrowserPlatform`] is what the background coordinator may touch: tabs,
//! scripting, the side panel, the toolbar badge and notifications.
//! [`PageSurface`] is what the per-page detector may touch: the current
//! selection and its own floating affordance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub type TabId = i64;
pub type WindowId = i64;

/// Element id (and global flag name) marking an instrumented page.
pub const DETECTOR_MARKER_ID: &str = "claire-selection-tooltip";

/// URL prefixes of privileged pages that cannot host the detector.
pub const RESTRICTED_URL_PREFIXES: [&str; 3] = ["chrome://", "chrome-extension://", "edge://"];

/// Whether a tab URL is off-limits for detector injection.
pub fn is_restricted_url(url: Option<&str>) -> bool {
    match url {
        None => true,
        Some(url) => url.is_empty() || RESTRICTED_URL_PREFIXES.iter().any(|p| url.starts_with(p)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: Option<WindowId>,
    pub url: Option<String>,
}

/// Toolbar badge content. Empty text clears the badge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Badge {
    pub text: String,
    pub background_color: Option<String>,
}

impl Badge {
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn with_color(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            background_color: Some(color.into()),
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.text.is_empty()
    }
}

/// A basic browser notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub icon_path: String,
    pub require_interaction: bool,
}

/// Browser capabilities available to the background coordinator.
#[async_trait]
pub trait BrowserPlatform: Send + Sync {
    /// Makes a toolbar-icon click open the side panel.
    async fn set_panel_opens_on_action_click(&self, enabled: bool) -> Result<()>;

    /// All open tabs across windows.
    async fn query_tabs(&self) -> Result<Vec<TabInfo>>;

    /// The active tab of the focused window, if any.
    async fn active_tab(&self) -> Result<Option<TabInfo>>;

    /// Checks whether the detector marker is already present in a tab.
    async fn probe_detector(&self, tab_id: TabId) -> Result<bool>;

    /// Injects the detector script and stylesheet into a tab.
    async fn inject_detector(&self, tab_id: TabId) -> Result<()>;

    async fn open_side_panel(&self, window_id: WindowId) -> Result<()>;

    async fn set_badge(&self, badge: Badge) -> Result<()>;

    async fn create_notification(&self, id: &str, notification: Notification) -> Result<()>;

    async fn clear_notification(&self, id: &str) -> Result<()>;

    /// Version string of the running extension.
    fn extension_version(&self) -> String;
}

/// Viewport rectangle of the first selection range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Document coordinates at which the affordance is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffordancePosition {
    pub x: f64,
    pub y: f64,
}

/// What the affordance currently says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AffordanceLabel {
    #[default]
    Ask,
    Working,
    Error,
}

impl AffordanceLabel {
    pub fn text(&self) -> &'static str {
        match self {
            AffordanceLabel::Ask => "Ask Claire",
            AffordanceLabel::Working => "Opening...",
            AffordanceLabel::Error => "Error",
        }
    }
}

/// Location of the page hosting the detector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageLocation {
    pub url: String,
    pub title: String,
}

/// The page-side surface the selection detector draws on.
///
/// DOM access is synchronous; implementations must be cheap.
pub trait PageSurface: Send + Sync {
    /// Current selection string, untrimmed.
    fn selection_text(&self) -> String;

    /// Bounding box of the first selection range, if there is one.
    fn selection_rect(&self) -> Option<SelectionRect>;

    fn scroll_y(&self) -> f64;

    /// Whether the affordance element (or global marker) already exists.
    fn has_marker(&self) -> bool;

    /// Creates the affordance element (hidden) and sets the marker.
    fn mount_affordance(&self);

    fn show_affordance(&self, position: AffordancePosition);

    fn hide_affordance(&self);

    fn set_affordance_label(&self, label: AffordanceLabel);

    fn location(&self) -> PageLocation;
}
