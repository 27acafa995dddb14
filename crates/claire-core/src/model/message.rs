//! Transcript message types.
//!
//! Messages are immutable once appended; append order is display order.

use serde::{Deserialize, Serialize};

/// Text of the bubble shown when a send fails for any reason.
pub const ERROR_BUBBLE_TEXT: &str = "Error occurred.";

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Message from the user.
    User,
    /// Message from the AI assistant (including error bubbles).
    Assistant,
}

impl Sender {
    /// Maps a backend role string; only `user` (any case) is the user.
    pub fn from_role(role: &str) -> Self {
        if role.eq_ignore_ascii_case("user") {
            Sender::User
        } else {
            Sender::Assistant
        }
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Display text; may embed escaped markup when `is_html` is set.
    pub text: String,
    pub sender: Sender,
    #[serde(default)]
    pub is_html: bool,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            is_html: false,
            is_error: false,
        }
    }

    /// A user bubble whose text is pre-rendered markup.
    pub fn user_html(html: impl Into<String>) -> Self {
        Self {
            is_html: true,
            ..Self::user(html)
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            is_html: false,
            is_error: false,
        }
    }

    /// The generic assistant-sender bubble appended when a send fails.
    pub fn error_bubble() -> Self {
        Self {
            is_error: true,
            ..Self::assistant(ERROR_BUBBLE_TEXT)
        }
    }
}

/// Returns the most recent `cap` messages, oldest first.
pub fn recent_history(transcript: &[Message], cap: usize) -> &[Message] {
    let start = transcript.len().saturating_sub(cap);
    &transcript[start..]
}
