//! Conversation sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title shown for sessions whose first message yields no text.
pub const UNTITLED_CHAT: &str = "Untitled Chat";

const QUESTION_MARKER: &str = "Question:";
const CONTEXT_MARKER: &str = "Context:";

/// Mints a new session id. Session ids are the correlation key with the backend.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// A row of the session sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    /// Calendar date of creation (`YYYY-MM-DD`), empty when unknown.
    pub date: String,
    /// Creation time in Unix milliseconds, 0 when unknown.
    pub timestamp: i64,
}

impl SessionSummary {
    pub fn new(
        id: impl Into<String>,
        first_message: &str,
        created_at: Option<DateTime<Utc>>,
        title_max_chars: usize,
    ) -> Self {
        Self {
            id: id.into(),
            title: derive_title(first_message, title_max_chars),
            date: created_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            timestamp: created_at.map(|at| at.timestamp_millis()).unwrap_or(0),
        }
    }
}

/// Derives a sidebar title from a session's first message.
///
/// Messages sent with page context look like `Context: "..."\n\nQuestion: ...`;
/// the question is the interesting part. Falls back to the context text, then
/// the raw message, then [`UNTITLED_CHAT`].
pub fn derive_title(message: &str, max_chars: usize) -> String {
    let title = if let Some((before, after)) = message.rsplit_once(QUESTION_MARKER) {
        let after = after.trim();
        if after.is_empty() { before.trim() } else { after }
    } else if let Some((before, after)) = message.rsplit_once(CONTEXT_MARKER) {
        let after = after.trim();
        if after.is_empty() { before.trim() } else { after }
    } else {
        message.trim()
    };

    let title = match title.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", title[..byte_idx].trim_end()),
        None => title.to_string(),
    };

    if title.is_empty() {
        UNTITLED_CHAT.to_string()
    } else {
        title
    }
}
