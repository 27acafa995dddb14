//! Runtime channel from a page or panel to the coordinator.

use async_trait::async_trait;

use super::message::{Request, Response};
use crate::error::Result;
use crate::platform::TabInfo;

/// Identity of the context that sent a request, as attached by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSender {
    /// The page's tab; `None` for extension pages such as the panel.
    pub tab: Option<TabInfo>,
}

impl MessageSender {
    pub fn from_tab(tab: TabInfo) -> Self {
        Self { tab: Some(tab) }
    }

    pub fn extension_page() -> Self {
        Self { tab: None }
    }

    pub fn window_id(&self) -> Option<i64> {
        self.tab.as_ref().and_then(|tab| tab.window_id)
    }
}

/// Request/response channel to the coordinator.
///
/// `Err` means the request never got an answer (coordinator unreachable);
/// a reachable coordinator reports failures inside the [`Response`].
#[async_trait]
pub trait RuntimeChannel: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}
