//! Authentication state and the auth-guarded backend.
//!
//! Sign-in happens in a browser tab via SSO; the callback page sets
//! `isAuthenticated` in the store, which the watcher picks up to re-check the
//! identity. Any 401 from the backend clears the cached auth keys.

use async_trait::async_trait;
use claire_core::backend::{ChatRequest, ChatSessionRow, ClaireBackend, ListChatsRequest, RemoteMessage};
use claire_core::error::Result;
use claire_core::model::{ProjectRef, UserProfile};
use claire_core::store::{KvStore, StorageKey};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const AUTH_KEYS: [StorageKey; 2] = [StorageKey::User, StorageKey::IsAuthenticated];

pub struct AuthService {
    backend: Arc<dyn ClaireBackend>,
    store: Arc<dyn KvStore>,
    user: RwLock<Option<UserProfile>>,
}

impl AuthService {
    pub fn new(backend: Arc<dyn ClaireBackend>, store: Arc<dyn KvStore>) -> Self {
        Self {
            backend,
            store,
            user: RwLock::new(None),
        }
    }

    /// Asks the backend who we are.
    ///
    /// Success caches `user` and `isAuthenticated`; any failure removes both.
    pub async fn check_auth(&self) -> bool {
        match self.backend.identity().await {
            Ok(profile) => {
                let cached = self
                    .store
                    .set(vec![
                        (StorageKey::User, profile.0.clone()),
                        (StorageKey::IsAuthenticated, Value::Bool(true)),
                    ])
                    .await;
                if let Err(e) = cached {
                    warn!("[Auth] Failed to cache identity: {}", e);
                }
                info!(
                    "[Auth] Signed in as {}",
                    profile.display_name().unwrap_or("<unknown>")
                );
                *self.user.write().await = Some(profile);
                true
            }
            Err(e) => {
                debug!("[Auth] Identity check failed: {}", e);
                self.clear().await;
                false
            }
        }
    }

    /// Ends the backend session. On failure the local state is kept.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.backend.logout().await {
            warn!("[Auth] Logout failed: {}", e);
            return Err(e);
        }
        self.clear().await;
        info!("[Auth] Signed out");
        Ok(())
    }

    /// The SSO entry point, to be opened in a browser tab.
    pub fn login_url(&self) -> String {
        self.backend.sso_login_url()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    /// Re-checks auth whenever `isAuthenticated` turns true in the store.
    pub fn spawn_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let mut changes = self.store.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change)
                        if change.key == StorageKey::IsAuthenticated
                            && change.new_value == Some(Value::Bool(true)) =>
                    {
                        debug!("[Auth] isAuthenticated set, re-checking identity");
                        service.check_auth().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("[Auth] Watcher lagged, {} changes skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    async fn clear(&self) {
        *self.user.write().await = None;
        if let Err(e) = self.store.remove(&AUTH_KEYS).await {
            warn!("[Auth] Failed to clear auth keys: {}", e);
        }
    }
}

/// Backend decorator that drops cached auth state on any `AuthRequired`.
pub struct AuthGuardedBackend {
    inner: Arc<dyn ClaireBackend>,
    store: Arc<dyn KvStore>,
}

impl AuthGuardedBackend {
    pub fn new(inner: Arc<dyn ClaireBackend>, store: Arc<dyn KvStore>) -> Self {
        Self { inner, store }
    }

    async fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_auth_required() {
                warn!("[Auth] Backend rejected credentials, clearing auth state");
                if let Err(e) = self.store.remove(&AUTH_KEYS).await {
                    warn!("[Auth] Failed to clear auth keys: {}", e);
                }
            }
        }
        result
    }
}

#[async_trait]
impl ClaireBackend for AuthGuardedBackend {
    async fn identity(&self) -> Result<UserProfile> {
        let result = self.inner.identity().await;
        self.guard(result).await
    }

    async fn logout(&self) -> Result<()> {
        let result = self.inner.logout().await;
        self.guard(result).await
    }

    fn sso_login_url(&self) -> String {
        self.inner.sso_login_url()
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRef>> {
        let result = self.inner.list_projects().await;
        self.guard(result).await
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<String> {
        let result = self.inner.send_chat(request).await;
        self.guard(result).await
    }

    async fn list_chats(&self, request: &ListChatsRequest) -> Result<Vec<ChatSessionRow>> {
        let result = self.inner.list_chats(request).await;
        self.guard(result).await
    }

    async fn load_session(&self, session_id: &str, project_id: i64) -> Result<Vec<RemoteMessage>> {
        let result = self.inner.load_session(session_id, project_id).await;
        self.guard(result).await
    }
}
