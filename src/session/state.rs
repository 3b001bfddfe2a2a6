//! Session state and the transcript model.
//!
//! [`SessionState`] is the single source of truth for everything the
//! presentation layer shows: active chat id, transcript, sidebar cache,
//! editor buffer, backend connectivity and busy state.
//!
//! [`SharedSession`] is a type alias for `Arc<Mutex<SessionState>>`, cheap
//! to clone and safe to share across tasks.  Locks are held only for short
//! synchronous sections, never across an `.await`.

use std::sync::{Arc, Mutex};

use crate::backend::ChatSummary;

pub(crate) const ONLINE_NOTICE: &str = "Assistant is online. Checking backend connection...";

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Visual category of a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    Output,
    Error,
}

/// One console line.  Rebuilt from chat messages whenever a session is
/// (re)loaded; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub text: String,
    pub kind: EntryKind,
}

impl TranscriptEntry {
    pub fn new(kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(EntryKind::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(EntryKind::Assistant, text)
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::new(EntryKind::Output, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(EntryKind::Error, text)
    }
}

// ---------------------------------------------------------------------------
// Connectivity / SessionPhase
// ---------------------------------------------------------------------------

/// Result of the most recent reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// No probe has completed yet.  Commands are refused.
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

/// Coarse phase of the session, derived from [`SessionState`].
///
/// ```text
/// CheckingBackend ──probe ok/fail──▶ Idle
/// Idle ──submit (connected)──▶ Processing ──all responses settled──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    CheckingBackend,
    Idle,
    Processing,
}

impl SessionPhase {
    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::CheckingBackend => "Checking backend",
            SessionPhase::Idle => "Idle",
            SessionPhase::Processing => "Processing",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Change notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TranscriptAppended(TranscriptEntry),
    TranscriptReplaced(Vec<TranscriptEntry>),
    EditorUpdated(String),
    SidebarRefreshed(Vec<ChatSummary>),
    ActiveChatChanged(Option<String>),
    ConnectivityChanged(Connectivity),
    BusyChanged(bool),
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Shared session state, mutated only by
/// [`SessionManager`](crate::session::SessionManager).
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Backend-assigned chat id.  `None` until the first successful exchange
    /// of a new chat; never reassigned once set.
    pub active_chat_id: Option<String>,

    /// Console lines in display order.
    pub transcript: Vec<TranscriptEntry>,

    /// Cached `{id, title}` list of known chats.
    pub sidebar: Vec<ChatSummary>,

    /// Code editor contents.
    pub editor: String,

    pub connectivity: Connectivity,

    /// `true` while the startup probe is outstanding.
    pub checking_backend: bool,

    /// Number of outstanding code requests.
    pub in_flight: usize,

    /// Bumped by every mutating operation.  A response is applied only if
    /// the generation it captured is still current.
    pub generation: u64,

    /// Bumped when a history load starts, so only the newest load applies.
    pub load_ticket: u64,
}

impl SessionState {
    /// Fresh state with the startup notice as the only transcript line.
    pub fn new(initial_code: impl Into<String>) -> Self {
        Self {
            active_chat_id: None,
            transcript: vec![TranscriptEntry::assistant(ONLINE_NOTICE)],
            sidebar: Vec::new(),
            editor: initial_code.into(),
            connectivity: Connectivity::Unknown,
            checking_backend: false,
            in_flight: 0,
            generation: 0,
            load_ticket: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.in_flight > 0 {
            SessionPhase::Processing
        } else if self.checking_backend {
            SessionPhase::CheckingBackend
        } else {
            SessionPhase::Idle
        }
    }

    /// Returns `true` while any code request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_connected(&self) -> bool {
        self.connectivity == Connectivity::Connected
    }

    /// Start a new generation and return it.
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Start a new history load and return its ticket.  Does not touch the
    /// generation: a load that has not landed must not supersede anything.
    pub(crate) fn next_load_ticket(&mut self) -> u64 {
        self.load_ticket += 1;
        self.load_ticket
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(String::new())
    }
}

// ---------------------------------------------------------------------------
// SharedSession
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionState`].
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedSession`] with `initial_code` in the editor.
pub fn new_shared_session(initial_code: impl Into<String>) -> SharedSession {
    Arc::new(Mutex::new(SessionState::new(initial_code)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
