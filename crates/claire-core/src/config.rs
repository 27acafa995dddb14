//! Runtime configuration.
//!
//! Every timing constant and size limit is configurable so that tests can
//! shrink intervals and windows without touching the code paths under test.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Root configuration, usually loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClaireConfig {
    pub backend: BackendConfig,
    pub timing: TimingConfig,
    pub limits: LimitsConfig,
}

impl ClaireConfig {
    /// Parses a TOML document; missing sections and fields keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Remote backend location and request policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub chat_path: String,
    /// Prefix of the chat-history routes (`<history_base>/all/chats`, ...).
    pub history_base: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            chat_path: "/chat".to_string(),
            history_base: "/dev/chat-history".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Timers and windows used by the coordinator, detector and panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Maximum age of a captured selection the panel will adopt.
    pub freshness_window_ms: i64,
    pub inactivity_threshold_ms: i64,
    pub poll_interval_ms: u64,
    pub selection_debounce_ms: u64,
    /// Delay before re-checking the selection after a pointer-down elsewhere.
    pub dismiss_recheck_ms: u64,
    /// Delay before hiding the affordance after it was activated.
    pub affordance_hide_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: 10_000,
            inactivity_threshold_ms: 30_000,
            poll_interval_ms: 30_000,
            selection_debounce_ms: 10,
            dismiss_recheck_ms: 50,
            affordance_hide_ms: 300,
        }
    }
}

impl TimingConfig {
    /// Zero delays everywhere, for tests that don't care about timing.
    pub fn immediate() -> Self {
        Self {
            selection_debounce_ms: 0,
            dismiss_recheck_ms: 0,
            affordance_hide_ms: 0,
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn selection_debounce(&self) -> Duration {
        Duration::from_millis(self.selection_debounce_ms)
    }

    pub fn dismiss_recheck(&self) -> Duration {
        Duration::from_millis(self.dismiss_recheck_ms)
    }

    pub fn affordance_hide(&self) -> Duration {
        Duration::from_millis(self.affordance_hide_ms)
    }
}

/// Size caps for cached and displayed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Messages kept in the local transcript cache.
    pub history_cap: usize,
    pub session_list_limit: u32,
    pub title_max_chars: usize,
    pub context_preview_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            history_cap: 50,
            session_list_limit: 50,
            title_max_chars: 45,
            context_preview_chars: 200,
        }
    }
}
