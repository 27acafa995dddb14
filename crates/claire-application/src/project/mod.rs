//! Project context: the project list and the current project.
//!
//! `currentProjectId` scopes chat sends and history queries. It is always
//! defined once the panel has initialized (default `1`).

use claire_core::backend::ClaireBackend;
use claire_core::error::Result;
use claire_core::model::{DEFAULT_PROJECT_ID, ProjectRef};
use claire_core::store::{KvStore, KvStoreExt, StorageKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Reads the stored project id, falling back to the default when it is
/// missing, zero, or unreadable.
pub async fn stored_project_id(store: &dyn KvStore) -> i64 {
    match store.get_value::<i64>(StorageKey::CurrentProjectId).await {
        Ok(Some(id)) if id != 0 => id,
        Ok(_) => DEFAULT_PROJECT_ID,
        Err(e) => {
            warn!("[Project] Failed to read current project: {}", e);
            DEFAULT_PROJECT_ID
        }
    }
}

pub struct ProjectContext {
    backend: Arc<dyn ClaireBackend>,
    store: Arc<dyn KvStore>,
    projects: RwLock<Vec<ProjectRef>>,
    current: RwLock<Option<i64>>,
    loading: AtomicBool,
}

impl ProjectContext {
    pub fn new(backend: Arc<dyn ClaireBackend>, store: Arc<dyn KvStore>) -> Self {
        Self {
            backend,
            store,
            projects: RwLock::new(Vec::new()),
            current: RwLock::new(None),
            loading: AtomicBool::new(false),
        }
    }

    /// Loads the project list and resolves the current project.
    pub async fn init(&self) -> Result<i64> {
        self.refresh_projects().await;
        self.resolve_current().await
    }

    /// Fetches the project list. A failed fetch leaves an empty list.
    pub async fn refresh_projects(&self) -> Vec<ProjectRef> {
        self.loading.store(true, Ordering::SeqCst);
        let projects = match self.backend.list_projects().await {
            Ok(projects) => {
                debug!("[Project] Loaded {} projects", projects.len());
                projects
            }
            Err(e) => {
                warn!("[Project] Failed to load projects: {}", e);
                Vec::new()
            }
        };
        *self.projects.write().await = projects.clone();
        self.loading.store(false, Ordering::SeqCst);
        projects
    }

    /// Reads `currentProjectId`, persisting the default when none is stored.
    pub async fn resolve_current(&self) -> Result<i64> {
        let id = match self
            .store
            .get_value::<i64>(StorageKey::CurrentProjectId)
            .await?
        {
            Some(id) if id != 0 => id,
            _ => {
                self.store
                    .set_value(StorageKey::CurrentProjectId, &DEFAULT_PROJECT_ID)
                    .await?;
                DEFAULT_PROJECT_ID
            }
        };
        *self.current.write().await = Some(id);
        Ok(id)
    }

    /// Persists `project_id` as the current project and returns it.
    pub async fn switch_project(&self, project_id: i64) -> Result<i64> {
        *self.current.write().await = Some(project_id);
        self.store
            .set_value(StorageKey::CurrentProjectId, &project_id)
            .await?;
        info!("[Project] Switched to project {}", project_id);
        Ok(project_id)
    }

    pub async fn projects(&self) -> Vec<ProjectRef> {
        self.projects.read().await.clone()
    }

    pub async fn current_project_id(&self) -> Option<i64> {
        *self.current.read().await
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}
