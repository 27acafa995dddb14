//! Application layer for Claire.
//!
//! Use cases for each execution context: the background coordinator, the
//! per-page selection detector, and the panel with its chat, history,
//! project and auth services. Everything talks to the outside world through
//! the interfaces in `claire-core`.

pub mod auth;
pub mod chat;
pub mod coordinator;
pub mod history;
pub mod panel;
pub mod project;
pub mod selection;

#[cfg(test)]
mod test_support;

pub use auth::{AuthGuardedBackend, AuthService};
pub use chat::ChatDispatcher;
pub use coordinator::{
    Coordinator, CoordinatorChannel, InjectionReport, InstallReason, MonitorPhase, TickOutcome,
};
pub use history::SessionHistoryClient;
pub use panel::{ClairePanel, PanelActivityTracker, PanelSessionController, PanelView, SendOutcome};
pub use project::ProjectContext;
pub use selection::SelectionDetector;
