//! HTTP client for the Claire backend.
//!
//! Cookies set by the SSO flow are kept in the client's cookie store and sent
//! with every request. A 401 from any route maps to
//! [`ClaireError::AuthRequired`]; any other failure maps to
//! [`ClaireError::NetworkFailure`].

use async_trait::async_trait;
use claire_core::backend::{ChatRequest, ChatSessionRow, ClaireBackend, ListChatsRequest, RemoteMessage};
use claire_core::config::BackendConfig;
use claire_core::error::{ClaireError, Result};
use claire_core::model::{ProjectRef, UserProfile};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Reply fields checked in order; the first non-empty string wins.
const REPLY_FIELDS: [&str; 4] = ["response", "message", "text", "content"];

pub struct HttpBackend {
    client: Client,
    base_url: String,
    chat_path: String,
    history_base: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClaireError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_path: config.chat_path.clone(),
            history_base: config.history_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn history_url(&self, suffix: &str) -> String {
        self.url(&format!("{}{}", self.history_base, suffix))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_http_error(status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClaireError::network(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ClaireBackend for HttpBackend {
    async fn identity(&self) -> Result<UserProfile> {
        let profile: UserProfile = self
            .send_json(self.client.get(self.url("/auth/identity")))
            .await?;
        if profile.0.is_null() {
            return Err(ClaireError::AuthRequired);
        }
        Ok(profile)
    }

    async fn logout(&self) -> Result<()> {
        self.send(self.client.post(self.url("/auth/logout")).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    fn sso_login_url(&self) -> String {
        self.url("/sso/login")
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRef>> {
        let body: Value = self
            .send_json(self.client.get(self.url("/project/all")))
            .await?;
        let projects = rows_of(body)?;
        debug!("[Backend] Loaded {} projects", projects.len());
        Ok(projects)
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<String> {
        debug!(
            "[Backend] POST {} (session: {}, project: {})",
            self.chat_path, request.session, request.project_id
        );
        let body: Value = self
            .send_json(self.client.post(self.url(&self.chat_path)).json(request))
            .await?;
        extract_reply(&body)
    }

    async fn list_chats(&self, request: &ListChatsRequest) -> Result<Vec<ChatSessionRow>> {
        let body: Value = self
            .send_json(self.client.post(self.history_url("/all/chats")).json(request))
            .await?;
        rows_of(body)
    }

    async fn load_session(&self, session_id: &str, project_id: i64) -> Result<Vec<RemoteMessage>> {
        let url = self.history_url(&format!("/session/{}", session_id));
        self.send_json(
            self.client
                .get(url)
                .query(&[("projectId", project_id.to_string())]),
        )
        .await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClaireError {
    match err.status() {
        Some(StatusCode::UNAUTHORIZED) => ClaireError::AuthRequired,
        Some(status) => ClaireError::http_status(status.as_u16(), err.to_string()),
        None if err.is_timeout() => ClaireError::network(format!("Request timed out: {}", err)),
        None => ClaireError::network(err.to_string()),
    }
}

fn map_http_error(status: StatusCode, body: String) -> ClaireError {
    if status == StatusCode::UNAUTHORIZED {
        return ClaireError::AuthRequired;
    }

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("HTTP error").to_string()
            } else {
                body
            }
        });
    warn!("[Backend] HTTP {}: {}", status.as_u16(), message);
    ClaireError::http_status(status.as_u16(), message)
}

/// Accepts `{"rows": [...]}` or a bare array.
fn rows_of<T: DeserializeOwned>(body: Value) -> Result<Vec<T>> {
    let rows = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => map.remove("rows").unwrap_or(Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };
    serde_json::from_value(rows)
        .map_err(|e| ClaireError::network(format!("Unexpected list shape: {}", e)))
}

fn extract_reply(body: &Value) -> Result<String> {
    REPLY_FIELDS
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ClaireError::network("Reply carried no text"))
}
