use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use claire_core::backend::{ChatRequest, ClaireBackend, ListChatsRequest};
use claire_core::config::BackendConfig;
use claire_core::error::ClaireError;
use claire_core::model::{Message, Sender};
use claire_infrastructure::HttpBackend;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Clone, Default)]
struct MockState {
    authenticated: Arc<Mutex<bool>>,
    chats: Arc<Mutex<Vec<ChatRequest>>>,
    session_queries: Arc<Mutex<Vec<(String, String)>>>,
}

async fn identity(State(state): State<MockState>) -> impl IntoResponse {
    if *state.authenticated.lock().expect("auth lock") {
        (StatusCode::OK, Json(json!({"name": "Ada", "email": "ada@example.com"})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})))
    }
}

async fn logout(State(state): State<MockState>) -> StatusCode {
    *state.authenticated.lock().expect("auth lock") = false;
    StatusCode::OK
}

async fn projects() -> Json<Value> {
    Json(json!({"rows": [{"id": 1, "name": "Default"}, {"id": 2, "name": "Research", "owner": "x"}]}))
}

async fn chat(State(state): State<MockState>, Json(request): Json<ChatRequest>) -> impl IntoResponse {
    if request.message == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "model crashed"})));
    }
    let reply = format!("echo: {}", request.message);
    state.chats.lock().expect("chats lock").push(request);
    (StatusCode::OK, Json(json!({"response": reply})))
}

async fn all_chats(State(state): State<MockState>, Json(request): Json<ListChatsRequest>) -> Json<Value> {
    let rows: Vec<Value> = state
        .chats
        .lock()
        .expect("chats lock")
        .iter()
        .filter(|chat| chat.project_id == request.project_id)
        .take(request.limit as usize)
        .map(|chat| {
            json!({
                "session": chat.session,
                "message": chat.message,
                "createdAt": "2025-05-01T10:00:00Z"
            })
        })
        .collect();
    Json(json!({ "rows": rows }))
}

async fn session(
    State(state): State<MockState>,
    Path(session_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let project_id = query.get("projectId").cloned().unwrap_or_default();
    state
        .session_queries
        .lock()
        .expect("queries lock")
        .push((session_id.clone(), project_id));

    let messages: Vec<Value> = state
        .chats
        .lock()
        .expect("chats lock")
        .iter()
        .filter(|chat| chat.session == session_id)
        .flat_map(|chat| {
            vec![
                json!({"message": chat.message, "role": "USER"}),
                json!({"message": format!("echo: {}", chat.message), "role": "ASSISTANT"}),
            ]
        })
        .collect();
    Json(Value::Array(messages))
}

async fn spawn_mock_server() -> (String, MockState, oneshot::Sender<()>) {
    let state = MockState::default();
    let app = Router::new()
        .route("/auth/identity", get(identity))
        .route("/auth/logout", post(logout))
        .route("/project/all", get(projects))
        .route("/chat", post(chat))
        .route("/dev/chat-history/all/chats", post(all_chats))
        .route("/dev/chat-history/session/{session_id}", get(session))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server listener");
    let address: SocketAddr = listener.local_addr().expect("mock listener local addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("run mock server");
    });
    (format!("http://{address}"), state, shutdown_tx)
}

fn backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url: base_url.to_string(),
        ..BackendConfig::default()
    })
    .expect("build backend")
}

fn chat_request(session: &str, message: &str) -> ChatRequest {
    ChatRequest {
        project_id: 1,
        session: session.to_string(),
        message: message.to_string(),
        url: Some("https://example.com".to_string()),
        file: None,
    }
}

#[tokio::test]
async fn identity_maps_401_to_auth_required() {
    let (base_url, state, _shutdown) = spawn_mock_server().await;
    let backend = backend(&base_url);

    assert_eq!(backend.identity().await.unwrap_err(), ClaireError::AuthRequired);

    *state.authenticated.lock().unwrap() = true;
    let profile = backend.identity().await.expect("identity");
    assert_eq!(profile.display_name(), Some("Ada"));

    backend.logout().await.expect("logout");
    assert!(backend.identity().await.unwrap_err().is_auth_required());
}

#[tokio::test]
async fn projects_are_read_from_rows() {
    let (base_url, _state, _shutdown) = spawn_mock_server().await;
    let projects = backend(&base_url).list_projects().await.expect("projects");

    assert_eq!(projects.len(), 2);
    assert_eq!(projects[1].id, 2);
    assert_eq!(projects[1].name, "Research");
}

#[tokio::test]
async fn chat_send_list_and_load_round_trip() {
    let (base_url, state, _shutdown) = spawn_mock_server().await;
    let backend = backend(&base_url);

    let reply = backend
        .send_chat(&chat_request("s-1", "Question: what is rust?"))
        .await
        .expect("send chat");
    assert_eq!(reply, "echo: Question: what is rust?");

    let rows = backend
        .list_chats(&ListChatsRequest {
            project_id: 1,
            limit: 50,
            offset: 0,
        })
        .await
        .expect("list chats");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].session, "s-1");
    assert!(rows[0].created_at_utc().is_some());

    let transcript: Vec<Message> = backend
        .load_session("s-1", 1)
        .await
        .expect("load session")
        .into_iter()
        .map(Message::from)
        .collect();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].sender, Sender::User);
    assert_eq!(transcript[1].sender, Sender::Assistant);

    let queries = state.session_queries.lock().unwrap().clone();
    assert_eq!(queries, vec![("s-1".to_string(), "1".to_string())]);
}

#[tokio::test]
async fn server_error_is_network_failure_with_status() {
    let (base_url, _state, _shutdown) = spawn_mock_server().await;
    let err = backend(&base_url)
        .send_chat(&chat_request("s-1", "boom"))
        .await
        .unwrap_err();

    assert_eq!(err, ClaireError::http_status(500, "model crashed"));
}

#[tokio::test]
async fn unreachable_server_is_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("addr");
    drop(listener);

    let err = backend(&format!("http://{address}"))
        .list_projects()
        .await
        .unwrap_err();
    assert!(err.is_network_failure());
}
