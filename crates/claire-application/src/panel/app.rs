//! Panel-level flows that span the controller, history, projects and auth.

use super::FlightGuard;
use super::activity::PanelActivityTracker;
use super::controller::PanelSessionController;
use crate::auth::AuthService;
use crate::history::SessionHistoryClient;
use crate::project::ProjectContext;
use claire_core::error::Result;
use claire_core::protocol::{Request, RuntimeChannel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Which top-level view the panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelView {
    #[default]
    Login,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched(i64),
    /// A switch or a send was already running; nothing changed.
    Busy,
}

pub struct ClairePanel {
    auth: Arc<AuthService>,
    projects: Arc<ProjectContext>,
    history: Arc<SessionHistoryClient>,
    controller: Arc<PanelSessionController>,
    activity: PanelActivityTracker,
    channel: Arc<dyn RuntimeChannel>,
    view: RwLock<PanelView>,
    sidebar_open: AtomicBool,
    switching_project: AtomicBool,
}

impl ClairePanel {
    pub fn new(
        auth: Arc<AuthService>,
        projects: Arc<ProjectContext>,
        history: Arc<SessionHistoryClient>,
        controller: Arc<PanelSessionController>,
        activity: PanelActivityTracker,
        channel: Arc<dyn RuntimeChannel>,
    ) -> Self {
        Self {
            auth,
            projects,
            history,
            controller,
            activity,
            channel,
            view: RwLock::new(PanelView::Login),
            sidebar_open: AtomicBool::new(false),
            switching_project: AtomicBool::new(false),
        }
    }

    /// Checks auth, then brings up projects and the conversation.
    pub async fn mount(&self) -> Result<PanelView> {
        if !self.auth.check_auth().await {
            info!("[Panel] Not signed in, showing login");
            *self.view.write().await = PanelView::Login;
            return Ok(PanelView::Login);
        }

        let project_id = self.projects.init().await?;
        self.controller.mount().await?;
        debug!("[Panel] Mounted on project {}", project_id);
        *self.view.write().await = PanelView::Chat;
        Ok(PanelView::Chat)
    }

    /// Signs out and returns to the login view.
    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await?;
        *self.view.write().await = PanelView::Login;
        Ok(())
    }

    /// Hydrates a session from history into the conversation.
    ///
    /// Returns `false` if the transcript could not be fetched.
    pub async fn select_session(&self, session_id: &str) -> Result<bool> {
        let Some(transcript) = self.history.load_session(session_id).await else {
            return Ok(false);
        };
        self.controller
            .adopt_session(session_id.to_string(), transcript)
            .await?;
        Ok(true)
    }

    /// Starts a new conversation under one freshly minted session id.
    ///
    /// Returns `None` while a send is in flight.
    pub async fn new_session(&self) -> Result<Option<String>> {
        if self.controller.is_processing() {
            debug!("[Panel] New session ignored while a send is in flight");
            return Ok(None);
        }
        let session_id = self.history.create_new_session().await?;
        if !self.controller.start_conversation(session_id.clone()).await? {
            return Ok(None);
        }
        Ok(Some(session_id))
    }

    /// Switches project, refreshes the session list and starts over.
    pub async fn switch_project(&self, project_id: i64) -> Result<SwitchOutcome> {
        let Some(_switching) = FlightGuard::try_acquire(&self.switching_project) else {
            debug!("[Panel] Project switch already running");
            return Ok(SwitchOutcome::Busy);
        };
        if self.controller.is_processing() {
            debug!("[Panel] Project switch ignored while a send is in flight");
            return Ok(SwitchOutcome::Busy);
        }

        self.projects.switch_project(project_id).await?;
        self.history.list_sessions().await;
        self.new_session().await?;
        Ok(SwitchOutcome::Switched(project_id))
    }

    /// Opens or closes the session sidebar, refreshing it on open.
    pub async fn toggle_sidebar(&self) -> bool {
        let open = !self.sidebar_open.fetch_xor(true, Ordering::SeqCst);
        if open {
            self.history.list_sessions().await;
        }
        open
    }

    /// Marks local activity and tells the coordinator about it.
    pub async fn record_activity(&self) {
        self.activity.touch();
        if let Err(e) = self.channel.send(Request::UserActivity).await {
            debug!("[Panel] Coordinator unreachable for activity: {}", e);
        }
    }

    pub async fn view(&self) -> PanelView {
        *self.view.read().await
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open.load(Ordering::SeqCst)
    }

    pub fn is_switching_project(&self) -> bool {
        self.switching_project.load(Ordering::SeqCst)
    }

    pub fn controller(&self) -> &Arc<PanelSessionController> {
        &self.controller
    }

    pub fn history(&self) -> &Arc<SessionHistoryClient> {
        &self.history
    }

    pub fn projects(&self) -> &Arc<ProjectContext> {
        &self.projects
    }

    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }

    pub fn activity(&self) -> &PanelActivityTracker {
        &self.activity
    }
}
