//! Wire shapes of the code-generation backend's JSON API.
//!
//! Response structs are deliberately lenient (`#[serde(default)]`): the
//! backend is treated as an opaque service and missing optional fields must
//! not turn a successful exchange into a parse failure.

use serde::{Deserialize, Serialize};

use crate::assistant::{Intent, Language};

/// `GET /`: reachability probe.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub message: Option<String>,
}

/// One entry of `GET /chats`, shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Who authored a stored message.
///
/// Anything other than `user` / `assistant` is kept as [`Role::Other`] so a
/// new server-side role does not break history loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// A stored chat message, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// `GET /chats/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Required: a body without it is not a chat history.
    pub messages: Vec<ChatMessage>,
}

/// `POST /chat-message` body.  `chat_id: None` asks the backend to mint a
/// new chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessageRequest {
    pub chat_id: Option<String>,
    pub intent: Intent,
    pub language: Language,
    pub task: String,
    pub chat_title: String,
}

/// `POST /chat-message` success body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

/// `POST /code-assistant` body (no chat persistence).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeAssistantRequest {
    pub intent: Intent,
    pub language: Language,
    pub task: String,
}

/// `POST /code-assistant` success body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CodeAssistantResponse {
    #[serde(default)]
    pub response: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_request_serialises_null_chat_id() {
        let req = ChatMessageRequest {
            chat_id: None,
            intent: Intent::ExplainCode,
            language: Language::TypeScript,
            task: "t".into(),
            chat_title: "explain this".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "chat_id": null,
                "intent": "explain_code",
                "language": "typescript",
                "task": "t",
                "chat_title": "explain this"
            })
        );
    }

    #[test]
    fn code_assistant_request_has_no_chat_fields() {
        let req = CodeAssistantRequest {
            intent: Intent::GenerateCode,
            language: Language::Python,
            task: "t".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("chat_id").is_none());
        assert_eq!(json["intent"], "generate_code");
    }

    #[test]
    fn history_with_unknown_role_and_extra_fields() {
        let raw = r#"{
            "chat_id": "abc",
            "title": "greet",
            "messages": [
                {"role": "user", "content": "hi", "created_at": "2024-01-01T00:00:00"},
                {"role": "system", "content": "note"},
                {"role": "assistant", "content": "```python\nprint(1)\n```"}
            ]
        }"#;
        let history: ChatHistory = serde_json::from_str(raw).unwrap();
        assert_eq!(history.messages.len(), 3);
        assert_eq!(history.messages[0].role, Role::User);
        assert_eq!(history.messages[1].role, Role::Other);
        assert_eq!(history.messages[2].role, Role::Assistant);
    }

    #[test]
    fn history_requires_messages() {
        let health = r#"{"message": "Backend running successfully!"}"#;
        assert!(serde_json::from_str::<ChatHistory>(health).is_err());

        let empty: ChatHistory = serde_json::from_str(r#"{"messages": []}"#).unwrap();
        assert!(empty.messages.is_empty());
        assert!(empty.chat_id.is_none());
    }

    #[test]
    fn chat_summaries_ignore_timestamps() {
        let raw = r#"[{"id": "1", "title": "a", "created_at": "x", "updated_at": "y"}]"#;
        let chats: Vec<ChatSummary> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            chats,
            vec![ChatSummary {
                id: "1".into(),
                title: "a".into()
            }]
        );
    }
}
