//! Conversational session management.
//!
//! This module ties utterances, backend responses, the editor buffer and the
//! transcript together over time.
//!
//! # Architecture
//!
//! ```text
//! final transcript (utterance)
//!        │
//!        ▼
//! SessionManager::submit_command()   ← may run in a spawned task
//!        │
//!        ├─ classify + build_task(editor text)
//!        ├─ CodeBackend::send_chat_message / code_assistant
//!        ├─ adopt chat id (first exchange only)
//!        ├─ transcript += reply, editor = extracted code
//!        └─ refresh_sidebar()
//!
//! SharedSession (Arc<Mutex<SessionState>>) ←── read by the presentation layer
//! SessionEvent (mpsc)                      ──▶ change notifications
//! ```

pub mod manager;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use manager::{SelectOutcome, SessionManager, SubmitOutcome};
pub use state::{
    new_shared_session, Connectivity, EntryKind, SessionEvent, SessionPhase, SessionState,
    SharedSession, TranscriptEntry,
};
