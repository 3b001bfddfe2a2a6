//! Best-effort code extraction from free-form assistant responses.
//!
//! Responses mix prose and code.  [`extract_code`] tries, in order:
//!
//! 1. The **first** fenced block (```` ```lang\n … ``` ````).  Later blocks
//!    are ignored rather than concatenated so only one example lands in the
//!    editor.
//! 2. Everything after the line containing `"here is the code"`
//!    (case-insensitive), with that line itself dropped.
//!
//! `None` means nothing could be recovered and the caller should show the
//! raw response instead; see [`extract_code_or_raw`].

use std::sync::OnceLock;

use regex::Regex;

const CODE_MARKER: &str = "here is the code";

/// Opening fence with an optional alphanumeric tag and a newline, then a lazy
/// body up to the next fence.
fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"```[a-zA-Z0-9]*\n((?s:.*?))```").expect("fence pattern is valid")
    })
}

/// Extract a code fragment from `response`, or `None` when no code can be
/// recovered.  Never panics.
///
/// # Example
/// ```rust
/// use voice_code_assistant::assistant::extract_code;
///
/// let reply = "Sure, here:\n```python\nprint(1)\n```\nDone";
/// assert_eq!(extract_code(Some(reply)).as_deref(), Some("print(1)"));
/// assert_eq!(extract_code(Some("no fences here, just text")), None);
/// ```
pub fn extract_code(response: Option<&str>) -> Option<String> {
    let text = response.filter(|t| !t.is_empty())?;

    // Single bounded scan: `captures` stops at the first fenced block.
    if let Some(body) = fence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| !body.is_empty())
    {
        return Some(body.to_string());
    }

    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let marker_at = text.to_ascii_lowercase().find(CODE_MARKER)?;
    let after_marker = text[marker_at..]
        .split('\n')
        .skip(1)
        .collect::<Vec<_>>()
        .join("\n");
    let after_marker = after_marker.trim();

    if after_marker.is_empty() {
        None
    } else {
        Some(after_marker.to_string())
    }
}

/// [`extract_code`] with the raw-response fallback applied.
pub fn extract_code_or_raw(response: &str) -> String {
    extract_code(Some(response)).unwrap_or_else(|| response.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_with_tag() {
        let reply = "Sure, here:\n```python\nprint(1)\n```\nDone";
        assert_eq!(extract_code(Some(reply)).as_deref(), Some("print(1)"));
    }

    #[test]
    fn fenced_block_without_tag() {
        let reply = "```\nconsole.log('hi');\n```";
        assert_eq!(extract_code(Some(reply)).as_deref(), Some("console.log('hi');"));
    }

    #[test]
    fn body_is_trimmed_but_inner_lines_kept() {
        let reply = "```python\n\n  def f():\n      return 1\n\n```";
        assert_eq!(
            extract_code(Some(reply)).as_deref(),
            Some("def f():\n      return 1")
        );
    }

    #[test]
    fn only_first_fence_is_used() {
        let reply = "One:\n```js\nfirst();\n```\nTwo:\n```js\nsecond();\n```";
        assert_eq!(extract_code(Some(reply)).as_deref(), Some("first();"));
    }

    #[test]
    fn plain_text_yields_none() {
        assert_eq!(extract_code(Some("no fences here, just text")), None);
    }

    #[test]
    fn missing_or_empty_input_yields_none() {
        assert_eq!(extract_code(None), None);
        assert_eq!(extract_code(Some("")), None);
    }

    #[test]
    fn marker_line_is_dropped() {
        let reply = "Here is the code\ndef f(): pass";
        assert_eq!(extract_code(Some(reply)).as_deref(), Some("def f(): pass"));
    }

    #[test]
    fn marker_is_case_insensitive_and_mid_line() {
        let reply = "Okay. HERE IS THE CODE you asked for:\n\n  x = 1\ny = 2\n";
        assert_eq!(extract_code(Some(reply)).as_deref(), Some("x = 1\ny = 2"));
    }

    #[test]
    fn marker_with_nothing_after_yields_none() {
        assert_eq!(extract_code(Some("here is the code")), None);
        assert_eq!(extract_code(Some("Here is the code:\n   \n")), None);
    }

    #[test]
    fn fence_without_newline_after_tag_is_not_a_block() {
        // The opening fence needs a newline before the body.
        assert_eq!(extract_code(Some("```python print(1)```")), None);
    }

    #[test]
    fn unterminated_fence_falls_through_to_marker() {
        let reply = "here is the code\n```python\nprint(2)";
        assert_eq!(
            extract_code(Some(reply)).as_deref(),
            Some("```python\nprint(2)")
        );
    }

    #[test]
    fn non_ascii_prose_before_marker() {
        let reply = "Voilà: here is the code:\nprint('é')";
        assert_eq!(extract_code(Some(reply)).as_deref(), Some("print('é')"));
    }

    #[test]
    fn raw_fallback() {
        assert_eq!(extract_code_or_raw("just words"), "just words");
        assert_eq!(extract_code_or_raw("```\nx\n```"), "x");
    }
}
