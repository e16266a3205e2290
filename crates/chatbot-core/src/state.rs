//! UI-agnostic conversation types
//!
//! These are shared by every front end and carry no terminal or rendering
//! concerns. `ChatMessage` doubles as the wire shape of one turn in the
//! `/api/chat` request body.

use serde::{Deserialize, Serialize};

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Marks assistant turns produced by a failure rather than the model.
    /// Local only, never sent to the backend.
    #[serde(skip)]
    pub is_error: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            is_error: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            is_error: true,
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Reachability of the configured backend, as last reported by a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Checking,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        *self == ConnectionStatus::Connected
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConnectionStatus::Checking => "Checking...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Error => "Disconnected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_without_error_flag() {
        let msg = ChatMessage::error("boom");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "boom"}));
    }

    #[test]
    fn role_uses_lowercase_names() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn status_labels() {
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Checking);
        assert_eq!(ConnectionStatus::Checking.display_name(), "Checking...");
        assert_eq!(ConnectionStatus::Connected.display_name(), "Connected");
        assert_eq!(ConnectionStatus::Error.display_name(), "Disconnected");
        assert!(!ConnectionStatus::Error.is_connected());
    }
}
