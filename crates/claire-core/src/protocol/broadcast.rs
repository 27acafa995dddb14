//! Publish/subscribe channel from the coordinator to any listening panel.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::SelectedText;

const BUS_CAPACITY: usize = 16;

/// Messages pushed to every subscriber without expecting a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Broadcast {
    UpdateSelectedText(SelectionUpdate),
}

/// A freshly captured selection, delivered live to an open panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionUpdate {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
}

impl From<SelectionUpdate> for SelectedText {
    fn from(update: SelectionUpdate) -> Self {
        SelectedText {
            text: update.text,
            url: update.url.unwrap_or_default(),
            page_title: update.page_title.unwrap_or_default(),
        }
    }
}

/// Best-effort fan-out. A publish with no subscribers is dropped, not queued:
/// a panel that opens later reads the persisted payload instead.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<Broadcast>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Publishes to current subscribers and returns how many received it.
    pub fn publish(&self, message: Broadcast) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}
