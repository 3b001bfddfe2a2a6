//! Keyword-based utterance classification.
//!
//! [`classify`] scans the lowercased utterance for fixed substrings and
//! returns the intent and target language.  Unmatched input falls back to
//! [`Intent::GenerateCode`] and [`Language::Python`], so classification never
//! fails.
//!
//! Language checks run in a fixed order (JavaScript → TypeScript → Python)
//! and the first hit wins.  An utterance naming both "javascript" and
//! "typescript" therefore resolves to JavaScript.  The short tokens `js` and
//! `ts` are plain substring checks and can match inside longer words
//! (`jsfiddle`, `lists`); only the Python token carries a trailing-space
//! guard (`"py "`).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// What the user wants the backend to do with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[default]
    GenerateCode,
    ExplainCode,
}

impl Intent {
    /// Wire name used by the backend (`generate_code` / `explain_code`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::GenerateCode => "generate_code",
            Intent::ExplainCode => "explain_code",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Target programming language of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    /// Wire name, also used as the fenced-block tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub intent: Intent,
    pub language: Language,
}

struct LanguageRule {
    language: Language,
    tokens: &'static [&'static str],
}

/// Checked in order; first rule with a matching token wins.
static LANGUAGE_RULES: &[LanguageRule] = &[
    LanguageRule {
        language: Language::JavaScript,
        tokens: &["javascript", "js"],
    },
    LanguageRule {
        language: Language::TypeScript,
        tokens: &["typescript", "ts"],
    },
    LanguageRule {
        language: Language::Python,
        tokens: &["python", "py "],
    },
];

const EXPLAIN_KEYWORD: &str = "explain";

/// Classify a raw utterance.
///
/// # Example
/// ```rust
/// use voice_code_assistant::assistant::{classify, Intent, Language};
///
/// let c = classify("Explain this TypeScript function");
/// assert_eq!(c.intent, Intent::ExplainCode);
/// assert_eq!(c.language, Language::TypeScript);
/// ```
pub fn classify(utterance: &str) -> Classification {
    let text = utterance.to_lowercase();

    let intent = if text.contains(EXPLAIN_KEYWORD) {
        Intent::ExplainCode
    } else {
        Intent::GenerateCode
    };

    let language = LANGUAGE_RULES
        .iter()
        .find(|rule| rule.tokens.iter().any(|token| text.contains(token)))
        .map(|rule| rule.language)
        .unwrap_or_default();

    Classification { intent, language }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
