//! HttpBackend and SessionManager against an in-process fake backend.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use voice_code_assistant::assistant::{Intent, Language};
use voice_code_assistant::backend::{
    BackendError, ChatMessageRequest, CodeAssistantRequest, CodeBackend, HttpBackend, Role,
};
use voice_code_assistant::config::{AppConfig, BackendConfig};
use voice_code_assistant::session::{Connectivity, SelectOutcome, SessionManager, SubmitOutcome};

/// Bodies posted to `/chat-message`, in arrival order.
type Recorded = Arc<Mutex<Vec<Value>>>;

const ANSWER: &str = "Here you go:\n```python\nprint('hi')\n```";

async fn health() -> Json<Value> {
    Json(json!({ "message": "Backend running successfully!" }))
}

async fn list_chats() -> Json<Value> {
    Json(json!([
        { "id": "c1", "title": "greet in python" },
        { "id": "c2", "title": "explain sorting" }
    ]))
}

async fn chat_history(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "c1" => Json(json!({
            "chat_id": "c1",
            "title": "greet in python",
            "messages": [
                { "role": "user", "content": "write python code to greet" },
                { "role": "assistant", "content": ANSWER }
            ]
        }))
        .into_response(),
        "garbled" => (StatusCode::OK, "definitely not json").into_response(),
        "odd id/with?chars" => Json(json!({ "chat_id": id, "messages": [] })).into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Chat not found." })),
        )
            .into_response(),
    }
}

async fn chat_message(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    let chat_id = body
        .get("chat_id")
        .and_then(Value::as_str)
        .unwrap_or("c-new")
        .to_string();
    recorded.lock().unwrap().push(body);
    Json(json!({ "chat_id": chat_id, "response": ANSWER }))
}

async fn code_assistant() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}

async fn spawn_fake_backend() -> (String, Recorded) {
    let recorded: Recorded = Arc::default();
    let app = Router::new()
        .route("/", get(health))
        .route("/chats", get(list_chats))
        .route("/chats/{id}", get(chat_history))
        .route("/chat-message", post(chat_message))
        .route("/code-assistant", post(code_assistant))
        .with_state(Arc::clone(&recorded));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), recorded)
}

fn backend_config(base_url: &str) -> BackendConfig {
    BackendConfig {
        base_url: base_url.to_string(),
        ..BackendConfig::default()
    }
}

fn app_config(base_url: &str, persistence_enabled: bool) -> AppConfig {
    AppConfig {
        backend: BackendConfig {
            persistence_enabled,
            ..backend_config(base_url)
        },
        ..AppConfig::default()
    }
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_server_message() {
    let (url, _) = spawn_fake_backend().await;
    let backend = HttpBackend::from_config(&backend_config(&url));

    let status = backend.health().await.unwrap();
    assert_eq!(status.message.as_deref(), Some("Backend running successfully!"));
}

#[tokio::test]
async fn list_chats_decodes_summaries() {
    let (url, _) = spawn_fake_backend().await;
    let backend = HttpBackend::from_config(&backend_config(&url));

    let chats = backend.list_chats().await.unwrap();
    let ids: Vec<&str> = chats.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c1", "c2"]);
    assert_eq!(chats[1].title, "explain sorting");
}

#[tokio::test]
async fn chat_history_decodes_messages() {
    let (url, _) = spawn_fake_backend().await;
    let backend = HttpBackend::from_config(&backend_config(&url));

    let history = backend.chat_history("c1").await.unwrap();
    assert_eq!(history.chat_id.as_deref(), Some("c1"));
    assert_eq!(history.messages.len(), 2);
    assert_eq!(history.messages[0].role, Role::User);
    assert_eq!(history.messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn not_found_surfaces_server_detail() {
    let (url, _) = spawn_fake_backend().await;
    let backend = HttpBackend::from_config(&backend_config(&url));

    let err = backend.chat_history("missing").await.unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 404, .. }));
    assert_eq!(err.to_string(), "Chat not found.");
}

#[tokio::test]
async fn server_error_without_json_is_generic() {
    let (url, _) = spawn_fake_backend().await;
    let backend = HttpBackend::from_config(&backend_config(&url));

    let request = CodeAssistantRequest {
        intent: Intent::GenerateCode,
        language: Language::Python,
        task: "anything".into(),
    };
    let err = backend.code_assistant(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed with status 500");
}

#[tokio::test]
async fn malformed_success_body_is_a_parse_error() {
    let (url, _) = spawn_fake_backend().await;
    let backend = HttpBackend::from_config(&backend_config(&url));

    let err = backend.chat_history("garbled").await.unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn new_chat_is_posted_with_null_id() {
    let (url, recorded) = spawn_fake_backend().await;
    let backend = HttpBackend::from_config(&backend_config(&url));

    let request = ChatMessageRequest {
        chat_id: None,
        intent: Intent::GenerateCode,
        language: Language::JavaScript,
        task: "task".into(),
        chat_title: "write javascript code".into(),
    };
    let response = backend.send_chat_message(&request).await.unwrap();
    assert_eq!(response.chat_id.as_deref(), Some("c-new"));

    let posted = recorded.lock().unwrap();
    assert_eq!(posted.len(), 1);
    assert!(posted[0]["chat_id"].is_null());
    assert_eq!(posted[0]["language"], "javascript");
    assert_eq!(posted[0]["intent"], "generate_code");
}

#[tokio::test]
async fn chat_id_reaches_the_server_as_one_segment() {
    let (url, _) = spawn_fake_backend().await;
    let backend = HttpBackend::from_config(&backend_config(&url));

    let history = backend.chat_history("odd id/with?chars").await.unwrap();
    assert_eq!(history.chat_id.as_deref(), Some("odd id/with?chars"));
}

#[tokio::test]
async fn dot_dot_chat_id_never_reaches_the_health_route() {
    let (url, _) = spawn_fake_backend().await;
    let config = app_config(&url, true);
    let manager = SessionManager::new(&config, Arc::new(HttpBackend::from_config(&config.backend)));

    assert_eq!(manager.select_session(Some("..")).await, SelectOutcome::Failed);
    assert!(manager.active_chat_id().is_none());
    assert_eq!(
        manager.transcript().last().map(|e| e.text.as_str()),
        Some("Error loading chat: invalid chat id \"..\"")
    );
}

#[tokio::test]
async fn unreachable_backend_is_a_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::from_config(&backend_config(&format!("http://{addr}")));
    let err = backend.health().await.unwrap_err();
    assert!(
        matches!(err, BackendError::Request(_) | BackendError::Timeout),
        "got {err:?}"
    );
}

// ---------------------------------------------------------------------------
// SessionManager over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_round_trip_over_http() {
    let (url, recorded) = spawn_fake_backend().await;
    let config = app_config(&url, true);
    let manager = SessionManager::new(&config, Arc::new(HttpBackend::from_config(&config.backend)));

    assert_eq!(manager.check_backend().await, Connectivity::Connected);
    assert_eq!(manager.sidebar().len(), 2);

    let outcome = manager.submit_command("write python code to greet").await;
    assert_eq!(outcome, SubmitOutcome::Applied);
    assert_eq!(manager.active_chat_id().as_deref(), Some("c-new"));
    assert_eq!(manager.editor_text(), "print('hi')");

    // The second exchange reuses the minted id.
    manager.submit_command("now explain it").await;
    let posted = recorded.lock().unwrap();
    assert_eq!(posted.len(), 2);
    assert!(posted[0]["chat_id"].is_null());
    assert_eq!(posted[1]["chat_id"], "c-new");
    assert_eq!(posted[1]["intent"], "explain_code");
    assert_eq!(posted[1]["chat_title"], "now explain it");
}

#[tokio::test]
async fn loading_history_over_http_fills_editor() {
    let (url, _) = spawn_fake_backend().await;
    let config = app_config(&url, true);
    let manager = SessionManager::new(&config, Arc::new(HttpBackend::from_config(&config.backend)));

    manager.select_session(Some("c1")).await;
    assert_eq!(manager.active_chat_id().as_deref(), Some("c1"));
    assert_eq!(manager.editor_text(), "print('hi')");
    assert_eq!(manager.transcript().len(), 2);
}

#[tokio::test]
async fn one_shot_failure_is_reported_in_transcript() {
    let (url, _) = spawn_fake_backend().await;
    let config = app_config(&url, false);
    let manager = SessionManager::new(&config, Arc::new(HttpBackend::from_config(&config.backend)));

    manager.check_backend().await;
    let outcome = manager.submit_command("write python code").await;
    assert_eq!(outcome, SubmitOutcome::Failed);

    let last = manager.transcript().pop().unwrap();
    assert_eq!(
        last.text,
        "Error contacting assistant: Request failed with status 500"
    );
}
