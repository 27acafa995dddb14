//! Detector injection into tabs that were open before the extension loaded.

use super::Coordinator;
use claire_core::error::{ClaireError, Result};
use claire_core::platform::{DETECTOR_MARKER_ID, TabId, TabInfo, is_restricted_url};
use tracing::{debug, info, warn};

/// Per-tab results of one injection sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionReport {
    pub injected: Vec<TabId>,
    pub skipped: Vec<TabId>,
    pub failed: Vec<TabId>,
}

impl Coordinator {
    /// Injects the detector into every open tab that can host it.
    ///
    /// Restricted and already-instrumented tabs are skipped. A failing tab is
    /// logged and the sweep moves on.
    pub async fn inject_detectors(&self) -> InjectionReport {
        let mut report = InjectionReport::default();
        let tabs = match self.platform.query_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("[Coordinator] Could not list tabs for injection: {}", e);
                return report;
            }
        };

        for tab in tabs {
            match self.inject_into(&tab).await {
                Ok(()) => report.injected.push(tab.id),
                Err(ClaireError::InjectionSkipped { tab_id, reason }) => {
                    debug!("[Coordinator] Skipping tab {}: {}", tab_id, reason);
                    report.skipped.push(tab_id);
                }
                Err(e) => {
                    warn!("[Coordinator] Could not inject into tab {}: {}", tab.id, e);
                    report.failed.push(tab.id);
                }
            }
        }

        info!(
            "[Coordinator] Injection sweep: {} injected, {} skipped, {} failed",
            report.injected.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    async fn inject_into(&self, tab: &TabInfo) -> Result<()> {
        if is_restricted_url(tab.url.as_deref()) {
            return Err(ClaireError::injection_skipped(tab.id, "restricted URL"));
        }
        if self.platform.probe_detector(tab.id).await? {
            return Err(ClaireError::injection_skipped(
                tab.id,
                format!("{} already present", DETECTOR_MARKER_ID),
            ));
        }
        self.platform.inject_detector(tab.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::tests::{fixture, tab};
    use claire_infrastructure::PlatformCall;

    #[tokio::test]
    async fn test_sweep_sorts_tabs() {
        let f = fixture();
        f.platform.add_tab(tab(1, 1, "https://example.com")).await;
        f.platform.add_tab(tab(2, 1, "chrome://extensions")).await;
        f.platform.add_tab(tab(3, 1, "chrome-extension://abc/page.html")).await;
        f.platform.add_tab(tab(4, 1, "edge://settings")).await;
        f.platform
            .add_tab(TabInfo {
                id: 5,
                window_id: Some(1),
                url: None,
            })
            .await;
        f.platform.add_tab(tab(6, 1, "https://already.test")).await;
        f.platform.mark_instrumented(6).await;
        f.platform.add_tab(tab(7, 1, "https://locked.test")).await;
        f.platform.fail_injection(7).await;
        f.platform.add_tab(tab(8, 2, "https://other.test")).await;

        let report = f.coordinator.inject_detectors().await;

        assert_eq!(report.injected, vec![1, 8]);
        assert_eq!(report.skipped, vec![2, 3, 4, 5, 6]);
        assert_eq!(report.failed, vec![7]);
        assert!(f.platform.is_instrumented(8).await);
    }

    #[tokio::test]
    async fn test_second_sweep_does_not_reinject() {
        let f = fixture();
        f.platform.add_tab(tab(1, 1, "https://example.com")).await;

        f.coordinator.inject_detectors().await;
        let report = f.coordinator.inject_detectors().await;

        assert_eq!(report.skipped, vec![1]);
        let injections = f
            .platform
            .calls()
            .await
            .into_iter()
            .filter(|call| matches!(call, PlatformCall::InjectDetector(_)))
            .count();
        assert_eq!(injections, 1);
    }
}
