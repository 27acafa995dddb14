//! Panel session controller.
//!
//! Owns the panel's view of the current conversation: session id,
//! transcript, greeting, selected-text context and the in-flight flag. It
//! reconciles that view with the store on mount and persists a bounded
//! transcript cache after every change.

use super::FlightGuard;
use super::compose;
use crate::chat::ChatDispatcher;
use claire_core::clock::Clock;
use claire_core::config::{LimitsConfig, TimingConfig};
use claire_core::error::{ClaireError, Result};
use claire_core::model::{
    AttachmentMeta, Message, SelectedText, SelectionContext, SelectionPayload, new_session_id,
    recent_history,
};
use claire_core::protocol::{Broadcast, BroadcastBus};
use claire_core::store::{KvStore, KvStoreExt, SELECTION_KEYS, StorageKey, StoreSnapshot};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelStatus {
    #[default]
    Ready,
    Thinking,
}

impl PanelStatus {
    pub fn text(&self) -> &'static str {
        match self {
            PanelStatus::Ready => "Ready to help",
            PanelStatus::Thinking => "Thinking...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Blank text and no attachment.
    Empty,
    /// Another send has not finished yet.
    InFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Rejected(RejectReason),
    Replied(String),
    /// The error bubble was appended.
    Failed(ClaireError),
}

#[derive(Default)]
struct PanelState {
    session_id: String,
    transcript: Vec<Message>,
    greeting_visible: bool,
    selected: Option<SelectedText>,
    status: PanelStatus,
}

pub struct PanelSessionController {
    store: Arc<dyn KvStore>,
    dispatcher: Arc<ChatDispatcher>,
    clock: Arc<dyn Clock>,
    timing: TimingConfig,
    limits: LimitsConfig,
    state: Mutex<PanelState>,
    processing: AtomicBool,
}

impl PanelSessionController {
    pub fn new(
        store: Arc<dyn KvStore>,
        dispatcher: Arc<ChatDispatcher>,
        clock: Arc<dyn Clock>,
        timing: TimingConfig,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            timing,
            limits,
            state: Mutex::new(PanelState::default()),
            processing: AtomicBool::new(false),
        }
    }

    /// Restores the panel from the store.
    ///
    /// In order: honour `forceNewConversation`, resolve the session id, adopt
    /// the cached transcript, then consume any pending selection payload.
    pub async fn mount(&self) -> Result<()> {
        let forced = self
            .store
            .get_value::<bool>(StorageKey::ForceNewConversation)
            .await?
            .unwrap_or(false);
        if forced {
            self.store
                .remove(&[StorageKey::ForceNewConversation, StorageKey::ChatHistory])
                .await?;
            info!("[Panel] Panel was closed, starting a fresh conversation");
        }

        let session_id = match self
            .store
            .get_value::<String>(StorageKey::ClaireSession)
            .await?
        {
            Some(id) if !id.is_empty() => id,
            _ => new_session_id(),
        };
        self.store
            .set_value(StorageKey::ClaireSession, &session_id)
            .await?;

        let transcript = if forced {
            Vec::new()
        } else {
            self.cached_transcript().await
        };

        let selected = self.take_pending_selection().await?;

        let mut state = self.state.lock().await;
        debug!(
            "[Panel] Mounted session {} with {} cached messages",
            session_id,
            transcript.len()
        );
        state.session_id = session_id;
        state.greeting_visible = transcript.is_empty();
        state.transcript = transcript;
        state.status = PanelStatus::Ready;
        if selected.is_some() {
            state.selected = selected;
        }
        Ok(())
    }

    /// Applies UPDATE_SELECTED_TEXT broadcasts until the bus closes.
    pub fn listen_for_selection(self: &Arc<Self>, bus: &BroadcastBus) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut updates = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(Broadcast::UpdateSelectedText(update)) => {
                        debug!("[Panel] Selected text updated live");
                        controller.set_selected_text(Some(update.into())).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("[Panel] Missed {} broadcasts", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Sends one user turn and appends the reply (or an error bubble).
    ///
    /// The selected-text context is cleared afterwards whatever the outcome.
    pub async fn send_message(&self, text: &str, attachment: Option<AttachmentMeta>) -> SendOutcome {
        if text.trim().is_empty() && attachment.is_none() {
            return SendOutcome::Rejected(RejectReason::Empty);
        }
        let Some(_flight) = FlightGuard::try_acquire(&self.processing) else {
            debug!("[Panel] Send ignored, another send is in flight");
            return SendOutcome::Rejected(RejectReason::InFlight);
        };

        let (session_id, selected, transcript) = {
            let mut state = self.state.lock().await;
            state.status = PanelStatus::Thinking;
            let selected = state.selected.clone().filter(|s| !s.is_empty());
            let bubble = match &selected {
                Some(context) => Message::user_html(compose::context_bubble(
                    &context.text,
                    text,
                    self.limits.context_preview_chars,
                )),
                None => Message::user(text),
            };
            state.transcript.push(bubble);
            state.greeting_visible = false;
            (state.session_id.clone(), selected, state.transcript.clone())
        };
        self.persist(&transcript).await;

        let outbound = match &selected {
            Some(context) => compose::outbound_with_context(&context.text, text),
            None => text.to_string(),
        };
        let url = selected.as_ref().map(|context| context.url.as_str());
        let result = self
            .dispatcher
            .send(&outbound, &session_id, url, attachment)
            .await;

        let (outcome, transcript) = {
            let mut state = self.state.lock().await;
            state.selected = None;
            state.status = PanelStatus::Ready;
            // The reply belongs to the session it was sent from.
            let same_session = state.session_id == session_id;
            if !same_session {
                debug!("[Panel] Session {} was left during send, reply dropped", session_id);
            }
            let outcome = match result {
                Ok(reply) => {
                    if same_session {
                        state.transcript.push(Message::assistant(reply.clone()));
                    }
                    SendOutcome::Replied(reply)
                }
                Err(e) => {
                    warn!("[Panel] Send failed: {}", e);
                    if same_session {
                        state.transcript.push(Message::error_bubble());
                    }
                    SendOutcome::Failed(e)
                }
            };
            (outcome, same_session.then(|| state.transcript.clone()))
        };
        if let Some(transcript) = transcript {
            self.persist(&transcript).await;
        }
        outcome
    }

    /// Starts a new conversation with a fresh session id.
    ///
    /// Returns `false` without changing anything while a send is in flight.
    pub async fn refresh_chat(&self) -> Result<bool> {
        self.start_conversation(new_session_id()).await
    }

    /// Clears the transcript and switches to `session_id`.
    ///
    /// Refused (`false`) while a send is in flight.
    pub async fn start_conversation(&self, session_id: String) -> Result<bool> {
        if self.is_processing() {
            debug!("[Panel] New conversation ignored while a send is in flight");
            return Ok(false);
        }
        {
            let mut state = self.state.lock().await;
            state.transcript.clear();
            state.session_id = session_id.clone();
            state.greeting_visible = true;
            state.status = PanelStatus::Ready;
        }
        self.store.remove(&[StorageKey::ChatHistory]).await?;
        self.store
            .set_value(StorageKey::ClaireSession, &session_id)
            .await?;
        info!("[Panel] New conversation {}", session_id);
        Ok(true)
    }

    /// Replaces the conversation with a hydrated session from history.
    pub async fn adopt_session(&self, session_id: String, transcript: Vec<Message>) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.session_id = session_id.clone();
            state.greeting_visible = transcript.is_empty();
            state.transcript = transcript.clone();
        }
        self.store
            .set_value(StorageKey::ClaireSession, &session_id)
            .await?;
        if transcript.is_empty() {
            self.store.remove(&[StorageKey::ChatHistory]).await?;
        } else {
            self.persist(&transcript).await;
        }
        Ok(())
    }

    pub async fn session_id(&self) -> String {
        self.state.lock().await.session_id.clone()
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.state.lock().await.transcript.clone()
    }

    pub async fn greeting_visible(&self) -> bool {
        self.state.lock().await.greeting_visible
    }

    pub async fn status(&self) -> PanelStatus {
        self.state.lock().await.status
    }

    pub async fn selected_text(&self) -> Option<SelectedText> {
        self.state.lock().await.selected.clone()
    }

    pub async fn set_selected_text(&self, selected: Option<SelectedText>) {
        self.state.lock().await.selected = selected;
    }

    pub async fn clear_selected_text(&self) {
        self.set_selected_text(None).await;
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    async fn cached_transcript(&self) -> Vec<Message> {
        match self
            .store
            .get_value::<Vec<Message>>(StorageKey::ChatHistory)
            .await
        {
            Ok(transcript) => transcript.unwrap_or_default(),
            Err(e) => {
                warn!("[Panel] Ignoring unreadable chat history: {}", e);
                Vec::new()
            }
        }
    }

    /// Reads and deletes the selection payload, returning it if still fresh.
    async fn take_pending_selection(&self) -> Result<Option<SelectedText>> {
        let snapshot = self.store.get(&SELECTION_KEYS).await?;
        if snapshot.is_empty() {
            return Ok(None);
        }

        let adopted = match payload_from(&snapshot) {
            Some(payload)
                if payload.is_fresh(self.clock.now_millis(), self.timing.freshness_window_ms) =>
            {
                debug!("[Panel] Adopting selection from {}", payload.source_url);
                Some(payload.into_selected_text())
            }
            Some(_) => {
                debug!("[Panel] Discarding stale selection");
                None
            }
            None => None,
        };

        self.store.remove(&SELECTION_KEYS).await?;
        Ok(adopted)
    }

    async fn persist(&self, transcript: &[Message]) {
        let recent = recent_history(transcript, self.limits.history_cap);
        if let Err(e) = self.store.set_value(StorageKey::ChatHistory, recent).await {
            warn!("[Panel] Failed to cache chat history: {}", e);
        }
    }
}

/// Rebuilds a payload from its keys; needs non-empty text and a timestamp.
fn payload_from(snapshot: &StoreSnapshot) -> Option<SelectionPayload> {
    let text_of = |key: StorageKey| {
        snapshot
            .get(&key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let text = text_of(StorageKey::SelectedText);
    if text.is_empty() {
        return None;
    }
    let captured_at_millis = snapshot.get(&StorageKey::Timestamp).and_then(Value::as_i64)?;
    let context = snapshot
        .get(&StorageKey::Context)
        .and_then(|value| serde_json::from_value::<SelectionContext>(value.clone()).ok())
        .unwrap_or_default();

    Some(SelectionPayload {
        text,
        source_url: text_of(StorageKey::SelectedTextUrl),
        page_title: text_of(StorageKey::SelectedTextPageTitle),
        context,
        captured_at_millis,
    })
}
