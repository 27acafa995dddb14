//! Chat dispatcher: one outbound message, one reply.

use crate::project::stored_project_id;
use claire_core::backend::{ChatRequest, ClaireBackend};
use claire_core::error::{ClaireError, Result};
use claire_core::model::AttachmentMeta;
use claire_core::store::KvStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct ChatDispatcher {
    backend: Arc<dyn ClaireBackend>,
    store: Arc<dyn KvStore>,
    timeout: Duration,
}

impl ChatDispatcher {
    pub fn new(backend: Arc<dyn ClaireBackend>, store: Arc<dyn KvStore>, timeout: Duration) -> Self {
        Self {
            backend,
            store,
            timeout,
        }
    }

    /// Sends `text` within `session_id` for the current project and returns
    /// the assistant's reply.
    ///
    /// An empty `url` is omitted from the request. Expiry of the request
    /// timeout is reported as a network failure.
    pub async fn send(
        &self,
        text: &str,
        session_id: &str,
        url: Option<&str>,
        attachment: Option<AttachmentMeta>,
    ) -> Result<String> {
        let request = ChatRequest {
            project_id: stored_project_id(self.store.as_ref()).await,
            session: session_id.to_string(),
            message: text.to_string(),
            url: url.filter(|u| !u.is_empty()).map(str::to_string),
            file: attachment,
        };
        debug!(
            "[Chat] Dispatching message (session: {}, project: {})",
            request.session, request.project_id
        );

        match tokio::time::timeout(self.timeout, self.backend.send_chat(&request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("[Chat] No reply within {:?}", self.timeout);
                Err(ClaireError::network(format!(
                    "No reply within {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBackend;
    use claire_core::store::{KvStoreExt, StorageKey};
    use claire_infrastructure::MemoryKvStore;

    #[tokio::test]
    async fn test_send_uses_stored_project() {
        let backend = Arc::new(FakeBackend::new());
        let store = Arc::new(MemoryKvStore::new());
        store
            .set_value(StorageKey::CurrentProjectId, &2i64)
            .await
            .unwrap();
        let dispatcher = ChatDispatcher::new(backend.clone(), store, Duration::from_secs(60));

        let reply = dispatcher
            .send("hello", "s-1", Some("https://example.com"), None)
            .await
            .unwrap();

        assert_eq!(reply, "reply to hello");
        let sent = backend.sent();
        assert_eq!(sent[0].project_id, 2);
        assert_eq!(sent[0].session, "s-1");
        assert_eq!(sent[0].url.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn test_send_defaults_project_and_drops_empty_url() {
        let backend = Arc::new(FakeBackend::new());
        let dispatcher = ChatDispatcher::new(
            backend.clone(),
            Arc::new(MemoryKvStore::new()),
            Duration::from_secs(60),
        );

        let attachment = AttachmentMeta {
            name: "notes.txt".into(),
            size: 12,
            mime_type: "text/plain".into(),
        };
        dispatcher
            .send("hi", "s-1", Some(""), Some(attachment.clone()))
            .await
            .unwrap();

        let sent = backend.sent();
        assert_eq!(sent[0].project_id, 1);
        assert_eq!(sent[0].url, None);
        assert_eq!(sent[0].file, Some(attachment));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let backend = Arc::new(FakeBackend::new());
        backend.queue_reply(Err(ClaireError::http_status(500, "boom")));
        let dispatcher = ChatDispatcher::new(
            backend,
            Arc::new(MemoryKvStore::new()),
            Duration::from_secs(60),
        );

        let err = dispatcher.send("hi", "s-1", None, None).await.unwrap_err();
        assert!(err.is_network_failure());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_network_failure() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_chat_delay(Duration::from_secs(120));
        let dispatcher = ChatDispatcher::new(
            backend,
            Arc::new(MemoryKvStore::new()),
            Duration::from_secs(60),
        );

        let err = dispatcher.send("hi", "s-1", None, None).await.unwrap_err();
        assert_eq!(err, ClaireError::network("No reply within 60s"));
    }
}
