//! Session history client.
//!
//! Lists the current project's sessions for the sidebar, hydrates a chosen
//! session's transcript, and mints ids for new sessions. The backend is the
//! source of truth; `chatSessions` in the store is only a fallback cache.

use crate::project::stored_project_id;
use claire_core::backend::{ClaireBackend, ListChatsRequest};
use claire_core::config::LimitsConfig;
use claire_core::error::Result;
use claire_core::model::{Message, SessionSummary, new_session_id};
use claire_core::store::{KvStore, KvStoreExt, StorageKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub struct SessionHistoryClient {
    backend: Arc<dyn ClaireBackend>,
    store: Arc<dyn KvStore>,
    limits: LimitsConfig,
    sessions: RwLock<Vec<SessionSummary>>,
    current_session_id: RwLock<Option<String>>,
    /// Bumped by every `list_sessions` call; only the latest call applies.
    list_generation: AtomicU64,
    loading: AtomicBool,
}

impl SessionHistoryClient {
    pub fn new(backend: Arc<dyn ClaireBackend>, store: Arc<dyn KvStore>, limits: LimitsConfig) -> Self {
        Self {
            backend,
            store,
            limits,
            sessions: RwLock::new(Vec::new()),
            current_session_id: RwLock::new(None),
            list_generation: AtomicU64::new(0),
            loading: AtomicBool::new(false),
        }
    }

    /// Refreshes the session list for the current project.
    ///
    /// On failure the cached `chatSessions` and `currentSessionId` are used
    /// instead. When calls overlap only the most recent one updates the list
    /// and clears the loading flag. Returns the list this call produced.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let generation = self.list_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading.store(true, Ordering::SeqCst);

        let request = ListChatsRequest {
            project_id: stored_project_id(self.store.as_ref()).await,
            limit: self.limits.session_list_limit,
            offset: 0,
        };

        let (sessions, current) = match self.backend.list_chats(&request).await {
            Ok(rows) => {
                let sessions: Vec<SessionSummary> = rows
                    .iter()
                    .map(|row| {
                        SessionSummary::new(
                            row.session.clone(),
                            row.message.as_deref().unwrap_or_default(),
                            row.created_at_utc(),
                            self.limits.title_max_chars,
                        )
                    })
                    .collect();
                debug!(
                    "[History] Loaded {} sessions for project {}",
                    sessions.len(),
                    request.project_id
                );
                if let Err(e) = self.store.set_value(StorageKey::ChatSessions, &sessions).await {
                    warn!("[History] Failed to cache sessions: {}", e);
                }
                (Some(sessions), self.stored_current_session().await)
            }
            Err(e) => {
                warn!("[History] Failed to load sessions, using cache: {}", e);
                let cached = self
                    .store
                    .get_value::<Vec<SessionSummary>>(StorageKey::ChatSessions)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("[History] Unreadable session cache: {}", e);
                        None
                    });
                (cached, self.stored_current_session().await)
            }
        };

        if self.list_generation.load(Ordering::SeqCst) != generation {
            debug!("[History] Discarding superseded session list");
            return sessions.unwrap_or_default();
        }

        if let Some(sessions) = &sessions {
            *self.sessions.write().await = sessions.clone();
        }
        if let Some(current) = current {
            *self.current_session_id.write().await = Some(current);
        }
        self.loading.store(false, Ordering::SeqCst);

        match sessions {
            Some(sessions) => sessions,
            None => self.sessions().await,
        }
    }

    /// Fetches a session's transcript and makes it the current session.
    ///
    /// Returns `None` when the fetch fails; nothing changes in that case.
    pub async fn load_session(&self, session_id: &str) -> Option<Vec<Message>> {
        let project_id = stored_project_id(self.store.as_ref()).await;
        let remote = match self.backend.load_session(session_id, project_id).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!("[History] Failed to load session {}: {}", session_id, e);
                return None;
            }
        };

        let transcript: Vec<Message> = remote.into_iter().map(Message::from).collect();
        *self.current_session_id.write().await = Some(session_id.to_string());
        if let Err(e) = self
            .store
            .set_value(StorageKey::CurrentSessionId, session_id)
            .await
        {
            warn!("[History] Failed to persist current session: {}", e);
        }
        info!(
            "[History] Loaded session {} ({} messages)",
            session_id,
            transcript.len()
        );
        Some(transcript)
    }

    /// Mints a session id locally and makes it the current session.
    pub async fn create_new_session(&self) -> Result<String> {
        let session_id = new_session_id();
        *self.current_session_id.write().await = Some(session_id.clone());
        self.store
            .set_value(StorageKey::CurrentSessionId, &session_id)
            .await?;
        debug!("[History] Created session {}", session_id);
        Ok(session_id)
    }

    pub async fn sessions(&self) -> Vec<SessionSummary> {
        self.sessions.read().await.clone()
    }

    pub async fn current_session_id(&self) -> Option<String> {
        self.current_session_id.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    async fn stored_current_session(&self) -> Option<String> {
        match self
            .store
            .get_value::<String>(StorageKey::CurrentSessionId)
            .await
        {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                warn!("[History] Failed to read current session: {}", e);
                None
            }
        }
    }
}
