//! Task prompt builder.
//!
//! [`build_task`] produces the complete task text sent to the backend.  Two
//! templates exist:
//! * **With existing code**: the editor buffer is embedded verbatim and the
//!   backend is asked for the full updated code when the request edits it.
//! * **Without existing code**: only the utterance plus the answer format.
//!
//! Both end with the same instruction: exactly one fenced block tagged with
//! the classified language.  The builder never looks at session or network
//! state; callers pass the editor text in explicitly.

use super::classify::Classification;

/// Build the task text for `utterance`.
///
/// `existing_code` is the editor buffer at request time.  `None`, empty and
/// whitespace-only buffers all select the shorter template.
///
/// # Example
/// ```rust
/// use voice_code_assistant::assistant::{build_task, classify};
///
/// let c = classify("add a docstring");
/// let task = build_task(&c, "add a docstring", Some("def f():\n    pass"));
/// assert!(task.contains("Existing code:"));
/// assert!(task.contains("def f():\n    pass"));
/// assert!(task.contains("FULL UPDATED code"));
/// ```
pub fn build_task(
    classification: &Classification,
    utterance: &str,
    existing_code: Option<&str>,
) -> String {
    let language = classification.language.as_str();

    let task = match existing_code.filter(|code| !code.trim().is_empty()) {
        Some(code) => format!(
            "You are a coding assistant working with existing {language} code.\n\
             Existing code:\n\
             \n\
             {code}\n\
             \n\
             User request (in natural language):\n\
             {utterance}\n\
             \n\
             If the request asks to modify or extend the existing code, respond with the FULL UPDATED code.\n\
             Otherwise, respond with a single self-contained {language} code example.\n\
             Your answer must contain the final code inside one fenced code block like:\n\
             ```{language}\n\
             ...\n\
             ```"
        ),
        None => format!(
            "User request: {utterance}\n\
             \n\
             Respond with a single self-contained {language} code example.\n\
             Your answer must contain the code inside one fenced code block like:\n\
             ```{language}\n\
             ...\n\
             ```"
        ),
    };

    task.trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
