//! Composition of a user turn that carries selected page text.

use claire_core::model::text::{escape_html, truncate_text};

/// The bubble shown in the transcript: a truncated, escaped preview of the
/// context above the escaped question.
pub fn context_bubble(context: &str, question: &str, preview_chars: usize) -> String {
    format!(
        "<div class=\"message-with-context\"><div class=\"context-text\">{}</div><div class=\"user-question\">{}</div></div>",
        escape_html(&truncate_text(context, preview_chars)),
        escape_html(question)
    )
}

/// The text sent to the backend: the full context, then the question.
pub fn outbound_with_context(context: &str, question: &str) -> String {
    format!("Context: \"{}\"\n\nQuestion: {}", context, question)
}
