//! Per-page selection detector.
//!
//! Watches pointer and key events on a page, shows a single floating "Ask
//! Claire" affordance above a meaningful selection, and on activation hands
//! the selection to the coordinator with OPEN_CLAIRE.

use claire_core::config::TimingConfig;
use claire_core::model::SelectionContext;
use claire_core::platform::{AffordanceLabel, AffordancePosition, PageSurface, SelectionRect};
use claire_core::protocol::{OpenClaireRequest, Request, Response, RuntimeChannel};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const ESCAPE_KEY: &str = "Escape";
const AFFORDANCE_X_OFFSET: f64 = 50.0;
const AFFORDANCE_Y_OFFSET: f64 = 45.0;

/// Where the affordance goes for a selection: centred-ish, just above it.
pub fn affordance_position(rect: SelectionRect, scroll_y: f64) -> AffordancePosition {
    AffordancePosition {
        x: rect.left + rect.width / 2.0 - AFFORDANCE_X_OFFSET,
        y: rect.top + scroll_y - AFFORDANCE_Y_OFFSET,
    }
}

/// Selections of one character or less are ignored.
fn is_meaningful(text: &str) -> bool {
    text.chars().count() > 1
}

pub struct SelectionDetector {
    page: Arc<dyn PageSurface>,
    channel: Arc<dyn RuntimeChannel>,
    timing: TimingConfig,
    cached: Mutex<Option<String>>,
    /// Bumped by each pointer-up and each dismissal; a pending evaluation
    /// only runs if it still holds the latest value.
    generation: AtomicU64,
}

impl SelectionDetector {
    pub fn new(page: Arc<dyn PageSurface>, channel: Arc<dyn RuntimeChannel>, timing: TimingConfig) -> Self {
        Self {
            page,
            channel,
            timing,
            cached: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Mounts the affordance unless the page already carries the detector.
    pub fn install(&self) -> bool {
        if self.page.has_marker() {
            debug!("[Detector] Already present, not installing");
            return false;
        }
        self.page.mount_affordance();
        debug!("[Detector] Installed");
        true
    }

    /// Pointer released. Returns whether this call evaluated the selection
    /// (it does not if a later pointer-up or a dismissal superseded it).
    pub async fn on_pointer_up(&self, on_affordance: bool) -> bool {
        if on_affordance {
            return false;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.timing.selection_debounce()).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }

        let text = self.page.selection_text().trim().to_string();
        if !is_meaningful(&text) {
            self.dismiss().await;
            return true;
        }

        // Nothing to anchor the affordance to, so nothing to act on either.
        let Some(rect) = self.page.selection_rect() else {
            self.dismiss().await;
            return true;
        };
        *self.cached.lock().await = Some(text);
        self.page
            .show_affordance(affordance_position(rect, self.page.scroll_y()));
        true
    }

    /// Pointer pressed. Off the affordance, re-checks the selection shortly
    /// after and dismisses if it collapsed.
    pub async fn on_pointer_down(&self, on_affordance: bool) {
        if on_affordance {
            return;
        }
        tokio::time::sleep(self.timing.dismiss_recheck()).await;
        if !is_meaningful(self.page.selection_text().trim()) {
            self.dismiss().await;
        }
    }

    pub async fn on_key(&self, key: &str) {
        if key == ESCAPE_KEY {
            self.dismiss().await;
        }
    }

    /// The affordance was clicked. Returns whether the panel opened.
    pub async fn activate(&self) -> bool {
        let cached = self.cached.lock().await.clone();
        let mut opened = false;

        if let Some(text) = cached {
            self.page.set_affordance_label(AffordanceLabel::Working);
            let location = self.page.location();
            let request = Request::OpenClaire(OpenClaireRequest {
                text,
                url: Some(location.url),
                page_title: Some(location.title),
                context: Some(SelectionContext::TextSelection),
            });

            match self.channel.send(request).await {
                Ok(response) if response.is_success() => opened = true,
                Ok(response) => {
                    warn!(
                        "[Detector] Coordinator refused to open: {}",
                        response.error().unwrap_or("unknown error")
                    );
                    self.page.set_affordance_label(AffordanceLabel::Error);
                }
                Err(e) => {
                    warn!("[Detector] Coordinator unreachable: {}", e);
                    self.page.set_affordance_label(AffordanceLabel::Error);
                }
            }
        }

        tokio::time::sleep(self.timing.affordance_hide()).await;
        self.dismiss().await;
        opened
    }

    /// Answers background requests addressed to the page. Only PING is.
    pub fn handle(&self, request: &Request) -> Option<Response> {
        match request {
            Request::Ping => Some(Response::pong(None)),
            _ => None,
        }
    }

    pub async fn cached_selection(&self) -> Option<String> {
        self.cached.lock().await.clone()
    }

    async fn dismiss(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.page.hide_affordance();
        *self.cached.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeChannel, FakePage};
    use claire_core::error::{ClaireError, Result};
    use std::time::Duration;

    const RECT: SelectionRect = SelectionRect {
        left: 100.0,
        top: 200.0,
        width: 80.0,
        height: 20.0,
    };

    type Harness = (Arc<FakePage>, Arc<FakeChannel>, Arc<SelectionDetector>);

    fn detector_with(response: Result<Response>) -> Harness {
        let page = Arc::new(FakePage::default());
        let channel = Arc::new(FakeChannel::answering(response));
        let detector = Arc::new(SelectionDetector::new(
            page.clone(),
            channel.clone(),
            TimingConfig::default(),
        ));
        detector.install();
        (page, channel, detector)
    }

    fn detector() -> Harness {
        detector_with(Ok(Response::ok()))
    }

    #[test]
    fn test_position_sits_above_selection() {
        let position = affordance_position(RECT, 500.0);
        assert_eq!(position, AffordancePosition { x: 90.0, y: 655.0 });
    }

    #[tokio::test]
    async fn test_install_is_idempotent() {
        let (page, _, detector) = detector();
        assert!(!detector.install());
        assert_eq!(page.state.lock().unwrap().mounted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_meaningful_selection_shows_affordance() {
        let (page, _, detector) = detector();
        page.state.lock().unwrap().scroll_y = 500.0;
        page.select("  borrow checker  ", RECT);

        assert!(detector.on_pointer_up(false).await);

        assert!(page.is_visible());
        assert_eq!(page.position(), Some(AffordancePosition { x: 90.0, y: 655.0 }));
        assert_eq!(detector.cached_selection().await.as_deref(), Some("borrow checker"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_character_hides() {
        let (page, _, detector) = detector();
        page.select("ab", RECT);
        detector.on_pointer_up(false).await;
        assert!(page.is_visible());

        page.select(" a ", RECT);
        detector.on_pointer_up(false).await;
        assert!(!page.is_visible());
        assert!(detector.cached_selection().await.is_none());

        page.select("ab", RECT);
        detector.on_pointer_up(false).await;
        page.select("", RECT);
        detector.on_pointer_up(false).await;
        assert!(!page.is_visible());
        assert!(detector.cached_selection().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_without_bounds_hides() {
        let (page, _, detector) = detector();
        page.select("first pick", RECT);
        detector.on_pointer_up(false).await;
        assert!(page.is_visible());

        page.select("second pick", RECT);
        page.state.lock().unwrap().rect = None;
        assert!(detector.on_pointer_up(false).await);

        assert!(!page.is_visible());
        assert!(detector.cached_selection().await.is_none());
        assert!(!detector.activate().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_up_on_affordance_is_ignored() {
        let (page, _, detector) = detector();
        page.select("some text", RECT);

        assert!(!detector.on_pointer_up(true).await);
        assert!(!page.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_pointer_up_supersedes_earlier() {
        let (page, _, detector) = detector();
        page.select("some text", RECT);

        let first = {
            let detector = detector.clone();
            tokio::spawn(async move { detector.on_pointer_up(false).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = detector.on_pointer_up(false).await;

        assert!(!first.await.unwrap());
        assert!(second);
        assert!(page.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_down_dismisses_collapsed_selection() {
        let (page, _, detector) = detector();
        page.select("some text", RECT);
        detector.on_pointer_up(false).await;

        detector.on_pointer_down(false).await;
        assert!(page.is_visible());

        page.clear_selection();
        detector.on_pointer_down(false).await;
        assert!(!page.is_visible());
        assert!(detector.cached_selection().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_dismisses() {
        let (page, _, detector) = detector();
        page.select("some text", RECT);
        detector.on_pointer_up(false).await;

        detector.on_key("Enter").await;
        assert!(page.is_visible());
        detector.on_key("Escape").await;
        assert!(!page.is_visible());
        assert!(detector.cached_selection().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_sends_open_request() {
        let (page, channel, detector) = detector();
        page.select("explain this paragraph", RECT);
        detector.on_pointer_up(false).await;

        assert!(detector.activate().await);

        assert_eq!(
            channel.requests(),
            vec![Request::OpenClaire(OpenClaireRequest {
                text: "explain this paragraph".into(),
                url: Some("https://example.com/article".into()),
                page_title: Some("An Article".into()),
                context: Some(SelectionContext::TextSelection),
            })]
        );
        assert!(!page.is_visible());
        assert_eq!(page.label(), AffordanceLabel::Ask);
        assert!(detector.cached_selection().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_shows_error_then_hides() {
        let (page, _, detector) = detector_with(Ok(Response::failure("No window ID found")));
        page.select("some text", RECT);
        detector.on_pointer_up(false).await;

        let activation = {
            let detector = detector.clone();
            tokio::spawn(async move { detector.activate().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(page.label(), AffordanceLabel::Error);

        assert!(!activation.await.unwrap());
        assert!(!page.is_visible());
        assert_eq!(page.label(), AffordanceLabel::Ask);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_coordinator_is_an_error() {
        let (page, _, detector) =
            detector_with(Err(ClaireError::internal("receiving end does not exist")));
        page.select("some text", RECT);
        detector.on_pointer_up(false).await;

        let activation = {
            let detector = detector.clone();
            tokio::spawn(async move { detector.activate().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(page.label(), AffordanceLabel::Error);
        assert!(!activation.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_without_selection_sends_nothing() {
        let (_, channel, detector) = detector();
        assert!(!detector.activate().await);
        assert!(channel.requests().is_empty());
    }

    #[test]
    fn test_answers_ping_only() {
        let (_, _, detector) = detector();
        assert_eq!(detector.handle(&Request::Ping), Some(Response::pong(None)));
        assert_eq!(detector.handle(&Request::UserActivity), None);
    }
}
