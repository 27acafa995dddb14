//! Domain model shared by all three contexts.
//!
//! # Module Structure
//!
//! - `message`: transcript entries (`Message`, `Sender`)
//! - `selection`: captured page selections (`SelectionPayload`, `SelectedText`)
//! - `session`: session ids, titles and sidebar rows (`SessionSummary`)
//! - `project`: project scope (`ProjectRef`)
//! - `activity`: user activity timestamp (`ActivityState`)
//! - `user`: authenticated user profile and attachment metadata
//! - `text`: escaping and truncation helpers

mod activity;
mod message;
mod project;
mod selection;
mod session;
pub mod text;
mod user;

pub use activity::ActivityState;
pub use message::{ERROR_BUBBLE_TEXT, Message, Sender, recent_history};
pub use project::{DEFAULT_PROJECT_ID, ProjectRef};
pub use selection::{SelectedText, SelectionContext, SelectionPayload};
pub use session::{SessionSummary, UNTITLED_CHAT, derive_title, new_session_id};
pub use user::{AttachmentMeta, UserProfile};
