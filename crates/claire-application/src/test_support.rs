//! Hand-written fakes shared by the unit tests in this crate.

use async_trait::async_trait;
use claire_core::backend::{ChatRequest, ChatSessionRow, ClaireBackend, ListChatsRequest, RemoteMessage};
use claire_core::error::{ClaireError, Result};
use claire_core::model::{ProjectRef, UserProfile};
use claire_core::platform::{AffordanceLabel, AffordancePosition, PageLocation, PageSurface, SelectionRect};
use claire_core::protocol::{Request, Response, RuntimeChannel};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const FAKE_CREATED_AT: &str = "2025-05-01T10:00:00Z";

/// In-memory backend that remembers what was sent to it.
pub struct FakeBackend {
    pub authenticated: AtomicBool,
    pub fail_projects: AtomicBool,
    pub fail_lists: AtomicBool,
    pub fail_loads: AtomicBool,
    pub logout_calls: AtomicUsize,
    pub chat_delay: Mutex<Option<Duration>>,
    pub chat_replies: Mutex<VecDeque<Result<String>>>,
    pub projects: Mutex<Vec<ProjectRef>>,
    pub chats: Mutex<Vec<ChatRequest>>,
    pub list_requests: Mutex<Vec<ListChatsRequest>>,
    pub transcripts: Mutex<HashMap<String, Vec<RemoteMessage>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            authenticated: AtomicBool::new(true),
            fail_projects: AtomicBool::new(false),
            fail_lists: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
            logout_calls: AtomicUsize::new(0),
            chat_delay: Mutex::new(None),
            chat_replies: Mutex::new(VecDeque::new()),
            projects: Mutex::new(vec![
                ProjectRef {
                    id: 1,
                    name: "Default".into(),
                },
                ProjectRef {
                    id: 2,
                    name: "Research".into(),
                },
            ]),
            chats: Mutex::new(Vec::new()),
            list_requests: Mutex::new(Vec::new()),
            transcripts: Mutex::new(HashMap::new()),
        }
    }

    pub fn queue_reply(&self, reply: Result<String>) {
        self.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn set_chat_delay(&self, delay: Duration) {
        *self.chat_delay.lock().unwrap() = Some(delay);
    }

    pub fn sent(&self) -> Vec<ChatRequest> {
        self.chats.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClaireBackend for FakeBackend {
    async fn identity(&self) -> Result<UserProfile> {
        if self.authenticated.load(Ordering::SeqCst) {
            Ok(UserProfile(json!({"name": "Ada", "email": "ada@example.com"})))
        } else {
            Err(ClaireError::AuthRequired)
        }
    }

    async fn logout(&self) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.authenticated.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn sso_login_url(&self) -> String {
        "http://backend.test/sso/login".to_string()
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRef>> {
        if self.fail_projects.load(Ordering::SeqCst) {
            return Err(ClaireError::http_status(503, "projects unavailable"));
        }
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<String> {
        self.chats.lock().unwrap().push(request.clone());
        let delay = *self.chat_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("reply to {}", request.message)))?;

        let mut transcripts = self.transcripts.lock().unwrap();
        let transcript = transcripts.entry(request.session.clone()).or_default();
        transcript.push(RemoteMessage {
            message: Some(request.message.clone()),
            role: Some("USER".into()),
        });
        transcript.push(RemoteMessage {
            message: Some(reply.clone()),
            role: Some("ASSISTANT".into()),
        });
        Ok(reply)
    }

    async fn list_chats(&self, request: &ListChatsRequest) -> Result<Vec<ChatSessionRow>> {
        self.list_requests.lock().unwrap().push(*request);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(ClaireError::network("connection refused"));
        }

        let mut rows: Vec<ChatSessionRow> = Vec::new();
        for chat in self.chats.lock().unwrap().iter() {
            if chat.project_id != request.project_id || rows.iter().any(|r| r.session == chat.session) {
                continue;
            }
            rows.push(ChatSessionRow {
                session: chat.session.clone(),
                message: Some(chat.message.clone()),
                created_at: Some(json!(FAKE_CREATED_AT)),
            });
        }
        rows.truncate(request.limit as usize);
        Ok(rows)
    }

    async fn load_session(&self, session_id: &str, _project_id: i64) -> Result<Vec<RemoteMessage>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ClaireError::http_status(500, "history unavailable"));
        }
        Ok(self
            .transcripts
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Runtime channel that records requests and answers with a canned response.
pub struct FakeChannel {
    pub requests: Mutex<Vec<Request>>,
    pub response: Mutex<Result<Response>>,
}

impl FakeChannel {
    pub fn answering(response: Result<Response>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            response: Mutex::new(response),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RuntimeChannel for FakeChannel {
    async fn send(&self, request: Request) -> Result<Response> {
        self.requests.lock().unwrap().push(request);
        self.response.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct FakePageState {
    pub selection: String,
    pub rect: Option<SelectionRect>,
    pub scroll_y: f64,
    pub marker: bool,
    pub mounted: usize,
    pub visible: bool,
    pub position: Option<AffordancePosition>,
    pub label: AffordanceLabel,
}

/// A page whose selection and affordance live in memory.
#[derive(Default)]
pub struct FakePage {
    pub state: Mutex<FakePageState>,
}

impl FakePage {
    pub fn select(&self, text: &str, rect: SelectionRect) {
        let mut state = self.state.lock().unwrap();
        state.selection = text.to_string();
        state.rect = Some(rect);
    }

    pub fn clear_selection(&self) {
        let mut state = self.state.lock().unwrap();
        state.selection.clear();
        state.rect = None;
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().unwrap().visible
    }

    pub fn label(&self) -> AffordanceLabel {
        self.state.lock().unwrap().label
    }

    pub fn position(&self) -> Option<AffordancePosition> {
        self.state.lock().unwrap().position
    }
}

impl PageSurface for FakePage {
    fn selection_text(&self) -> String {
        self.state.lock().unwrap().selection.clone()
    }

    fn selection_rect(&self) -> Option<SelectionRect> {
        self.state.lock().unwrap().rect
    }

    fn scroll_y(&self) -> f64 {
        self.state.lock().unwrap().scroll_y
    }

    fn has_marker(&self) -> bool {
        self.state.lock().unwrap().marker
    }

    fn mount_affordance(&self) {
        let mut state = self.state.lock().unwrap();
        state.marker = true;
        state.mounted += 1;
    }

    fn show_affordance(&self, position: AffordancePosition) {
        let mut state = self.state.lock().unwrap();
        state.visible = true;
        state.position = Some(position);
    }

    fn hide_affordance(&self) {
        let mut state = self.state.lock().unwrap();
        state.visible = false;
        state.label = AffordanceLabel::Ask;
    }

    fn set_affordance_label(&self, label: AffordanceLabel) {
        self.state.lock().unwrap().label = label;
    }

    fn location(&self) -> PageLocation {
        PageLocation {
            url: "https://example.com/article".to_string(),
            title: "An Article".to_string(),
        }
    }
}
