//! Captured page selections.

use serde::{Deserialize, Serialize};

/// Why a selection payload was created. Only text selection exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionContext {
    #[default]
    TextSelection,
}

impl SelectionContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionContext::TextSelection => "text_selection",
        }
    }
}

/// A selection captured by the detector and parked in the store for the panel.
///
/// At most one is live at a time; the panel consumes it once, within the
/// freshness window, and deletes it whether or not it was adopted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPayload {
    pub text: String,
    pub source_url: String,
    pub page_title: String,
    pub context: SelectionContext,
    pub captured_at_millis: i64,
}

impl SelectionPayload {
    /// Whether the payload may still be adopted at `now_millis`.
    pub fn is_fresh(&self, now_millis: i64, window_millis: i64) -> bool {
        now_millis - self.captured_at_millis < window_millis
    }

    pub fn into_selected_text(self) -> SelectedText {
        SelectedText {
            text: self.text,
            url: self.source_url,
            page_title: self.page_title,
        }
    }
}

/// Selected-text context attached to the panel's compose box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SelectedText {
    pub text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub page_title: String,
}

impl SelectedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(captured_at_millis: i64) -> SelectionPayload {
        SelectionPayload {
            text: "selected".into(),
            source_url: "https://example.com".into(),
            page_title: "Example".into(),
            context: SelectionContext::TextSelection,
            captured_at_millis,
        }
    }

    #[test]
    fn test_freshness_window() {
        let p = payload(100_000);
        assert!(p.is_fresh(100_000, 10_000));
        assert!(p.is_fresh(109_999, 10_000));
        assert!(!p.is_fresh(110_000, 10_000));
        assert!(!p.is_fresh(111_000, 10_000));
    }

    #[test]
    fn test_context_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(SelectionContext::TextSelection).unwrap(),
            serde_json::json!("text_selection")
        );
        assert_eq!(SelectionContext::TextSelection.as_str(), "text_selection");
    }

    #[test]
    fn test_into_selected_text() {
        let selected = payload(0).into_selected_text();
        assert_eq!(selected.text, "selected");
        assert_eq!(selected.url, "https://example.com");
        assert_eq!(selected.page_title, "Example");
    }
}
