//! Command-to-code helpers for the voice code assistant.
//!
//! This module provides:
//! * [`classify`]: maps a spoken utterance to an [`Intent`] and [`Language`].
//! * [`build_task`]: builds the task prompt sent to the backend.
//! * [`extract_code`]: recovers a code fragment from a free-form response.
//!
//! Everything here is pure and synchronous; network and session state live
//! in [`crate::backend`] and [`crate::session`].
//!
//! # Quick start
//!
//! ```rust
//! use voice_code_assistant::assistant::{build_task, classify, extract_code_or_raw};
//!
//! let utterance = "write javascript code that adds two numbers";
//! let classification = classify(utterance);
//! let task = build_task(&classification, utterance, None);
//! assert!(task.contains("```javascript"));
//!
//! let reply = "Sure:\n```javascript\nconst add = (a, b) => a + b;\n```";
//! assert_eq!(extract_code_or_raw(reply), "const add = (a, b) => a + b;");
//! ```

pub mod classify;
pub mod extract;
pub mod task;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use classify::{classify, Classification, Intent, Language};
pub use extract::{extract_code, extract_code_or_raw};
pub use task::build_task;
