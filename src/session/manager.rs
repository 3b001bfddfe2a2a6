//! Session manager: drives the utterance → backend → editor round trip.
//!
//! [`SessionManager`] owns the [`SharedSession`] and exposes the operations
//! the presentation layer calls:
//!
//! ```text
//! check_backend()        GET /              → Connected / Disconnected
//! submit_command(text)   classify → build_task(editor) → POST
//!                          └─▶ adopt chat id, append reply, editor = code
//!                          └─▶ refresh_sidebar()            GET /chats
//! select_session(id)     GET /chats/{id}    → transcript + last code
//! new_session()          reset transcript (no network)
//! ```
//!
//! Every failure becomes an error transcript line; no operation returns an
//! error to the caller.  Locks are never held across an `.await`.
//!
//! Overlapping commands are allowed, but each mutating operation bumps the
//! session generation and a response is only applied if the generation it
//! captured is still current.  Stale responses are discarded.  A history load
//! bumps the generation only once it lands, so a failed `select_session`
//! leaves requests made in the current chat alone.

use std::sync::{Arc, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::assistant::{build_task, classify, extract_code_or_raw};
use crate::backend::{
    BackendError, ChatHistory, ChatMessageRequest, ChatSummary, CodeAssistantRequest,
    CodeBackend, Role,
};
use crate::config::AppConfig;

use super::state::{
    new_shared_session, Connectivity, SessionEvent, SessionPhase, SessionState, SharedSession,
    TranscriptEntry,
};

const CONNECTED_FALLBACK: &str = "Backend connected successfully.";
const NOT_CONNECTED: &str = "Error: Backend is not connected.";
const NEW_CHAT: &str = "Started a new chat.";
const EMPTY_CHAT: &str = "This chat has no messages yet.";
const NO_RESPONSE: &str = "No response from assistant.";
const HISTORY_DISABLED: &str = "chat history is disabled";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What [`SessionManager::submit_command`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Backend not connected; nothing was sent.
    Refused,
    /// Response applied to the transcript and editor.
    Applied,
    /// The request failed; an error line was appended.
    Failed,
    /// A newer operation superseded this one; the response was dropped.
    Discarded,
}

/// What [`SessionManager::select_session`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Fresh, empty chat; no network call.
    NewChat,
    /// History loaded; carries the number of messages.
    Loaded(usize),
    /// History could not be loaded; an error line was appended.
    Failed,
    /// A newer operation superseded this one; the history was dropped.
    Discarded,
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Orchestrates the conversational session.
///
/// Cheap to clone; clones share the same state and backend, so a clone can
/// be moved into a spawned task per command.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_code_assistant::backend::HttpBackend;
/// use voice_code_assistant::config::AppConfig;
/// use voice_code_assistant::session::SessionManager;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let backend = Arc::new(HttpBackend::from_config(&config.backend));
/// let manager = SessionManager::new(&config, backend);
///
/// manager.check_backend().await;
/// manager.submit_command("write javascript code that reverses a string").await;
/// println!("{}", manager.editor_text());
/// # }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    state: SharedSession,
    backend: Arc<dyn CodeBackend>,
    persistence_enabled: bool,
    backend_url: String,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionManager {
    /// Create a manager with a fresh session seeded from `config`.
    pub fn new(config: &AppConfig, backend: Arc<dyn CodeBackend>) -> Self {
        Self {
            state: new_shared_session(config.editor.initial_code.clone()),
            backend,
            persistence_enabled: config.backend.persistence_enabled,
            backend_url: config.backend.base_url.clone(),
            events: None,
        }
    }

    /// Forward change notifications to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Handle to the underlying state.
    pub fn state(&self) -> SharedSession {
        Arc::clone(&self.state)
    }

    pub fn persistence_enabled(&self) -> bool {
        self.persistence_enabled
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    pub fn active_chat_id(&self) -> Option<String> {
        self.lock().active_chat_id.clone()
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock().transcript.clone()
    }

    pub fn sidebar(&self) -> Vec<ChatSummary> {
        self.lock().sidebar.clone()
    }

    pub fn editor_text(&self) -> String {
        self.lock().editor.clone()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.lock().connectivity
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase()
    }

    // -----------------------------------------------------------------------
    // Presentation-layer writes
    // -----------------------------------------------------------------------

    /// Replace the editor buffer (user typing, file load).
    pub fn set_editor_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.lock().editor = text.clone();
        self.emit(SessionEvent::EditorUpdated(text));
    }

    /// Append a line to the transcript.
    pub fn append_entry(&self, entry: TranscriptEntry) {
        let mut st = self.lock();
        self.push_entry(&mut st, entry);
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Probe backend reachability and record the result.
    ///
    /// On success the sidebar is refreshed as well (persistence mode only).
    pub async fn check_backend(&self) -> Connectivity {
        self.lock().checking_backend = true;
        log::debug!("session: probing backend at {}", self.backend_url);

        let result = self.backend.health().await;

        let connectivity = {
            let mut st = self.lock();
            st.checking_backend = false;
            match result {
                Ok(health) => {
                    log::info!("session: backend reachable at {}", self.backend_url);
                    st.connectivity = Connectivity::Connected;
                    let notice = health
                        .message
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| CONNECTED_FALLBACK.to_string());
                    self.push_entry(&mut st, TranscriptEntry::assistant(notice));
                }
                Err(e) => {
                    log::warn!("session: backend unreachable at {}: {e}", self.backend_url);
                    st.connectivity = Connectivity::Disconnected;
                    let line = format!("Error: Cannot reach backend at {}", self.backend_url);
                    self.push_entry(&mut st, TranscriptEntry::error(line));
                }
            }
            st.connectivity
        };
        self.emit(SessionEvent::ConnectivityChanged(connectivity));

        if connectivity == Connectivity::Connected {
            self.refresh_sidebar().await;
        }
        connectivity
    }

    /// Re-fetch the full chat list and replace the sidebar cache.
    ///
    /// Failures are logged only.  Returns `true` when the cache was replaced.
    pub async fn refresh_sidebar(&self) -> bool {
        if !self.persistence_enabled {
            return false;
        }

        match self.backend.list_chats().await {
            Ok(chats) => {
                log::debug!("session: sidebar refreshed ({} chats)", chats.len());
                self.lock().sidebar = chats.clone();
                self.emit(SessionEvent::SidebarRefreshed(chats));
                true
            }
            Err(e) => {
                log::warn!("session: failed to load chats: {e}");
                false
            }
        }
    }

    /// Start a new chat: clear the active id and reset the transcript.
    ///
    /// The editor is cleared only when persistence is disabled.
    pub fn new_session(&self) {
        let mut st = self.lock();
        st.next_generation();
        self.reset_to_new_chat(&mut st);

        if !self.persistence_enabled {
            st.editor.clear();
            self.emit(SessionEvent::EditorUpdated(String::new()));
        }
    }

    /// Switch to chat `chat_id`, or to a fresh chat when `None`.
    ///
    /// Loading replaces the transcript with the stored history and puts the
    /// code of the most recent assistant message into the editor.  On
    /// failure the editor and active chat id are left untouched.
    pub async fn select_session(&self, chat_id: Option<&str>) -> SelectOutcome {
        let Some(chat_id) = chat_id else {
            let mut st = self.lock();
            st.next_generation();
            self.reset_to_new_chat(&mut st);
            return SelectOutcome::NewChat;
        };

        if !self.persistence_enabled {
            let line = format!("Error loading chat: {HISTORY_DISABLED}");
            self.append_entry(TranscriptEntry::error(line));
            return SelectOutcome::Failed;
        }

        let (generation, ticket) = {
            let mut st = self.lock();
            (st.generation, st.next_load_ticket())
        };
        log::debug!("session: loading chat {chat_id} (load {ticket})");

        let result = self.backend.chat_history(chat_id).await;

        let mut st = self.lock();
        if st.load_ticket != ticket || st.generation != generation {
            log::debug!("session: dropping stale history for chat {chat_id}");
            return SelectOutcome::Discarded;
        }
        match result {
            Ok(history) => {
                let count = history.messages.len();
                // Only a landed history supersedes requests made in the old chat.
                st.next_generation();
                self.apply_history(&mut st, chat_id, history);
                SelectOutcome::Loaded(count)
            }
            Err(e) => {
                log::warn!("session: failed to load chat {chat_id}: {e}");
                self.push_entry(&mut st, TranscriptEntry::error(format!("Error loading chat: {e}")));
                SelectOutcome::Failed
            }
        }
    }

    /// Handle one final voice transcript.
    ///
    /// The user line is appended before anything else.  While disconnected
    /// the command is refused locally without touching the network.
    pub async fn submit_command(&self, utterance: &str) -> SubmitOutcome {
        let classification = classify(utterance);

        let (chat_id, task, generation) = {
            let mut st = self.lock();
            self.push_entry(&mut st, TranscriptEntry::user(format!("You: \"{utterance}\"")));

            if !st.is_connected() {
                self.push_entry(&mut st, TranscriptEntry::error(NOT_CONNECTED));
                return SubmitOutcome::Refused;
            }

            let task = build_task(&classification, utterance, Some(st.editor.as_str()));
            let generation = st.next_generation();
            st.in_flight += 1;
            if st.in_flight == 1 {
                self.emit(SessionEvent::BusyChanged(true));
            }
            (st.active_chat_id.clone(), task, generation)
        };

        log::debug!(
            "session: submitting {:?} (intent={}, language={}, generation={})",
            utterance,
            classification.intent,
            classification.language,
            generation
        );

        let result = if self.persistence_enabled {
            let request = ChatMessageRequest {
                chat_id,
                intent: classification.intent,
                language: classification.language,
                task,
                chat_title: utterance.to_string(),
            };
            self.backend
                .send_chat_message(&request)
                .await
                .map(|r| (r.chat_id, r.response))
        } else {
            let request = CodeAssistantRequest {
                intent: classification.intent,
                language: classification.language,
                task,
            };
            self.backend
                .code_assistant(&request)
                .await
                .map(|r| (None, r.response))
        };

        let outcome = {
            let mut st = self.lock();
            st.in_flight = st.in_flight.saturating_sub(1);
            if st.in_flight == 0 {
                self.emit(SessionEvent::BusyChanged(false));
            }

            if st.generation != generation {
                log::debug!("session: dropping stale response (generation {generation})");
                SubmitOutcome::Discarded
            } else {
                match result {
                    Ok((minted_id, response)) => {
                        self.apply_response(&mut st, minted_id, response);
                        SubmitOutcome::Applied
                    }
                    Err(e) => {
                        self.report_failure(&mut st, &e);
                        SubmitOutcome::Failed
                    }
                }
            }
        };

        if outcome == SubmitOutcome::Applied {
            self.refresh_sidebar().await;
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Helpers (called with the lock held)
    // -----------------------------------------------------------------------

    fn apply_response(
        &self,
        st: &mut SessionState,
        minted_id: Option<String>,
        response: Option<String>,
    ) {
        // One-way: an assigned id is never replaced.
        if st.active_chat_id.is_none() {
            if let Some(id) = minted_id.filter(|id| !id.is_empty()) {
                log::info!("session: adopted chat id {id}");
                st.active_chat_id = Some(id.clone());
                self.emit(SessionEvent::ActiveChatChanged(Some(id)));
            }
        }

        let text = response
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| NO_RESPONSE.to_string());
        let code = extract_code_or_raw(&text);

        self.push_entry(st, TranscriptEntry::assistant(text));
        st.editor = code.clone();
        self.emit(SessionEvent::EditorUpdated(code));
    }

    fn report_failure(&self, st: &mut SessionState, error: &BackendError) {
        log::warn!("session: assistant request failed: {error}");
        let line = format!("Error contacting assistant: {error}");
        self.push_entry(st, TranscriptEntry::error(line));
    }

    fn apply_history(&self, st: &mut SessionState, chat_id: &str, history: ChatHistory) {
        let transcript: Vec<TranscriptEntry> = if history.messages.is_empty() {
            vec![TranscriptEntry::assistant(EMPTY_CHAT)]
        } else {
            history
                .messages
                .iter()
                .map(|m| match m.role {
                    Role::User => TranscriptEntry::user(m.content.clone()),
                    _ => TranscriptEntry::assistant(m.content.clone()),
                })
                .collect()
        };

        st.active_chat_id = Some(chat_id.to_string());
        st.transcript = transcript.clone();
        self.emit(SessionEvent::ActiveChatChanged(Some(chat_id.to_string())));
        self.emit(SessionEvent::TranscriptReplaced(transcript));

        let last_code = history
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .filter(|m| !m.content.is_empty())
            .map(|m| extract_code_or_raw(&m.content));

        if let Some(code) = last_code {
            st.editor = code.clone();
            self.emit(SessionEvent::EditorUpdated(code));
        }
    }

    fn reset_to_new_chat(&self, st: &mut SessionState) {
        st.active_chat_id = None;
        st.transcript = vec![TranscriptEntry::assistant(NEW_CHAT)];
        self.emit(SessionEvent::ActiveChatChanged(None));
        self.emit(SessionEvent::TranscriptReplaced(st.transcript.clone()));
    }

    fn push_entry(&self, st: &mut SessionState, entry: TranscriptEntry) {
        st.transcript.push(entry.clone());
        self.emit(SessionEvent::TranscriptAppended(entry));
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            // Receiver gone means the UI shut down; nothing to notify.
            let _ = tx.send(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
