//! Remote backend interface.
//!
//! The backend is the system of record for conversations. It is treated as
//! an opaque HTTP API; this trait is its contract, decoupling the panel logic
//! from transport details.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{AttachmentMeta, Message, ProjectRef, Sender, UserProfile};

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub project_id: i64,
    pub session: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AttachmentMeta>,
}

/// Body of `POST <history>/all/chats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChatsRequest {
    pub project_id: i64,
    pub limit: u32,
    pub offset: u32,
}

/// One row of the session listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionRow {
    pub session: String,
    #[serde(default)]
    pub message: Option<String>,
    /// ISO-8601 string or Unix milliseconds, depending on the backend.
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
}

impl ChatSessionRow {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        match self.created_at.as_ref()? {
            serde_json::Value::String(raw) => parse_timestamp(raw),
            serde_json::Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
            _ => None,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// One message of a hydrated session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl From<RemoteMessage> for Message {
    fn from(remote: RemoteMessage) -> Self {
        Message {
            text: remote.message.unwrap_or_default(),
            sender: Sender::from_role(remote.role.as_deref().unwrap_or_default()),
            is_html: false,
            is_error: false,
        }
    }
}

/// Contract of the remote backend.
///
/// Implementations map a 401 on any call to `ClaireError::AuthRequired` and
/// every other failure to `ClaireError::NetworkFailure`.
#[async_trait]
pub trait ClaireBackend: Send + Sync {
    /// `GET /auth/identity`
    async fn identity(&self) -> Result<UserProfile>;

    /// `POST /auth/logout`
    async fn logout(&self) -> Result<()>;

    /// URL of the SSO entry point; navigated by the browser, never fetched.
    fn sso_login_url(&self) -> String;

    /// `GET /project/all`
    async fn list_projects(&self) -> Result<Vec<ProjectRef>>;

    /// `POST /chat`, returning the assistant's reply text.
    async fn send_chat(&self, request: &ChatRequest) -> Result<String>;

    /// `POST <history>/all/chats`
    async fn list_chats(&self, request: &ListChatsRequest) -> Result<Vec<ChatSessionRow>>;

    /// `GET <history>/session/:id?projectId=..`
    async fn load_session(&self, session_id: &str, project_id: i64) -> Result<Vec<RemoteMessage>>;
}
