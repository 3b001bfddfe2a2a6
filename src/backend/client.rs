//! Core [`CodeBackend`] trait and the reqwest-based [`HttpBackend`].
//!
//! `HttpBackend` talks to the code-generation service over its JSON API.
//! All connection details come from [`BackendConfig`]; nothing is hardcoded.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::backend::types::{
    ChatHistory, ChatMessageRequest, ChatMessageResponse, ChatSummary, CodeAssistantRequest,
    CodeAssistantResponse, HealthStatus,
};
use crate::config::BackendConfig;

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("backend request timed out")]
    Timeout,

    /// Non-2xx response.  Displays the server's `detail` when it sent one.
    #[error("{}", status_message(.status, .detail))]
    Status { status: u16, detail: Option<String> },

    /// A chat id that cannot name a single path segment.
    #[error("invalid chat id {0:?}")]
    InvalidChatId(String),

    /// The response body was not the JSON shape we expected.
    #[error("failed to parse backend response: {0}")]
    Parse(String),
}

fn status_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.clone(),
        None => format!("Request failed with status {status}"),
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// CodeBackend trait
// ---------------------------------------------------------------------------

/// The remote code-generation service, as seen by the session layer.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn CodeBackend>`).
#[async_trait]
pub trait CodeBackend: Send + Sync {
    /// `GET /`: reachability probe.
    async fn health(&self) -> Result<HealthStatus, BackendError>;

    /// `GET /chats`: sidebar summaries.
    async fn list_chats(&self) -> Result<Vec<ChatSummary>, BackendError>;

    /// `GET /chats/{id}`: full message history of one chat.
    async fn chat_history(&self, chat_id: &str) -> Result<ChatHistory, BackendError>;

    /// `POST /chat-message`: persisted, contextual exchange.
    async fn send_chat_message(
        &self,
        request: &ChatMessageRequest,
    ) -> Result<ChatMessageResponse, BackendError>;

    /// `POST /code-assistant`: one-shot exchange without persistence.
    async fn code_assistant(
        &self,
        request: &CodeAssistantRequest,
    ) -> Result<CodeAssistantResponse, BackendError>;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// Calls the backend's HTTP API with reqwest.
///
/// Regular requests use `request_timeout_secs`; the reachability probe uses
/// the shorter `probe_timeout_secs` so a dead backend is reported quickly.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
}

impl HttpBackend {
    /// Build an `HttpBackend` from application config.
    ///
    /// A default client is used as a last-resort fallback if the builder
    /// fails (should never happen in practice).
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}/chats/{id}` with the id percent-encoded as one segment.
    fn chat_url(&self, chat_id: &str) -> Result<reqwest::Url, BackendError> {
        if chat_id.is_empty() || chat_id == "." || chat_id == ".." {
            return Err(BackendError::InvalidChatId(chat_id.to_string()));
        }
        let mut url = reqwest::Url::parse(&self.url("/chats"))
            .map_err(|e| BackendError::Request(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Request(format!("cannot-be-a-base URL: {}", self.base_url)))?
            .push(chat_id);
        Ok(url)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.client.get(self.url(path)).send().await?;
        decode(response).await
    }
}

/// Read the body once, then either surface the server's `detail` for a
/// non-2xx status or parse the success payload.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| json.get("detail").and_then(|d| d.as_str()).map(str::to_string));
        log::debug!("backend: HTTP {} (detail={:?})", status.as_u16(), detail);
        return Err(BackendError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
}

#[async_trait]
impl CodeBackend for HttpBackend {
    async fn health(&self) -> Result<HealthStatus, BackendError> {
        let response = self
            .client
            .get(self.url("/"))
            .timeout(self.probe_timeout)
            .send()
            .await?;
        decode(response).await
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, BackendError> {
        self.get_json("/chats").await
    }

    async fn chat_history(&self, chat_id: &str) -> Result<ChatHistory, BackendError> {
        let url = self.chat_url(chat_id)?;
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn send_chat_message(
        &self,
        request: &ChatMessageRequest,
    ) -> Result<ChatMessageResponse, BackendError> {
        log::debug!(
            "backend: POST /chat-message (chat_id={:?}, intent={}, language={})",
            request.chat_id,
            request.intent,
            request.language
        );
        self.post_json("/chat-message", request).await
    }

    async fn code_assistant(
        &self,
        request: &CodeAssistantRequest,
    ) -> Result<CodeAssistantResponse, BackendError> {
        log::debug!(
            "backend: POST /code-assistant (intent={}, language={})",
            request.intent,
            request.language
        );
        self.post_json("/code-assistant", request).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
