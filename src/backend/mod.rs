//! Client side of the remote code-generation backend.
//!
//! * [`CodeBackend`]: async trait the session layer talks to.
//! * [`HttpBackend`]: reqwest implementation of the backend's JSON API.
//! * [`BackendError`]: error variants for backend calls.
//! * [`types`]: request / response wire shapes.

pub mod client;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{BackendError, CodeBackend, HttpBackend};
pub use types::{
    ChatHistory, ChatMessage, ChatMessageRequest, ChatMessageResponse, ChatSummary,
    CodeAssistantRequest, CodeAssistantResponse, HealthStatus, Role,
};
