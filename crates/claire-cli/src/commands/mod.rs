pub mod conversation;
pub mod coordinator;

use anyhow::Result;
use claire_application::{
    AuthGuardedBackend, AuthService, ChatDispatcher, ClairePanel, Coordinator, CoordinatorChannel,
    PanelActivityTracker, PanelSessionController, ProjectContext, SessionHistoryClient,
};
use claire_core::backend::ClaireBackend;
use claire_core::clock::{Clock, SystemClock};
use claire_core::config::ClaireConfig;
use claire_core::protocol::{BroadcastBus, MessageSender};
use claire_infrastructure::{
    ClairePaths, ConfigService, HeadlessPlatform, HttpBackend, JsonFileKvStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Everything one CLI invocation runs against, wired like the extension:
/// one store, one backend, one coordinator.
pub struct Host {
    pub config: ClaireConfig,
    pub store: Arc<JsonFileKvStore>,
    pub backend: Arc<dyn ClaireBackend>,
    pub clock: Arc<dyn Clock>,
    pub coordinator: Arc<Coordinator>,
}

impl Host {
    pub fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let paths = match data_dir {
            Some(dir) => ClairePaths::with_base_dir(dir),
            None => ClairePaths::new()?,
        };
        debug!("[CLI] Using data dir {:?}", paths.base_dir());

        let config = ConfigService::new(paths.config_file()).load()?;
        let store = Arc::new(JsonFileKvStore::open(paths.store_file())?);
        let http = Arc::new(HttpBackend::new(&config.backend)?);
        let backend: Arc<dyn ClaireBackend> = Arc::new(AuthGuardedBackend::new(http, store.clone()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let coordinator = Arc::new(Coordinator::new(
            Arc::new(HeadlessPlatform::new(env!("CARGO_PKG_VERSION"))),
            store.clone(),
            BroadcastBus::new(),
            clock.clone(),
            config.timing.clone(),
        ));

        Ok(Self {
            config,
            store,
            backend,
            clock,
            coordinator,
        })
    }

    /// A panel talking to this host's coordinator.
    pub fn panel(&self) -> ClairePanel {
        let dispatcher = Arc::new(ChatDispatcher::new(
            self.backend.clone(),
            self.store.clone(),
            self.config.backend.request_timeout(),
        ));
        let controller = Arc::new(PanelSessionController::new(
            self.store.clone(),
            dispatcher,
            self.clock.clone(),
            self.config.timing.clone(),
            self.config.limits.clone(),
        ));

        ClairePanel::new(
            Arc::new(AuthService::new(self.backend.clone(), self.store.clone())),
            Arc::new(ProjectContext::new(self.backend.clone(), self.store.clone())),
            Arc::new(SessionHistoryClient::new(
                self.backend.clone(),
                self.store.clone(),
                self.config.limits.clone(),
            )),
            controller,
            PanelActivityTracker::new(self.clock.clone(), self.config.timing.inactivity_threshold_ms),
            Arc::new(CoordinatorChannel::new(
                self.coordinator.clone(),
                MessageSender::extension_page(),
            )),
        )
    }
}
