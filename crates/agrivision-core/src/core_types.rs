//! Core type definitions for the proxy's conversation protocol
//!
//! These types form the contract between the session store, the retention
//! policies and the completion gateway. Messages serialize to the
//! OpenAI-compatible `{"role": ..., "content": ...}` shape so a transcript can
//! be forwarded upstream without any translation step.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation. Never mutated after construction.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Inbound "send chat message" operation.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Generated reply plus the session identifier to use on the next turn.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serializes_lowercase_role() {
        let msg = Message::assistant("Rotate your crops.");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "Rotate your crops."}));
    }

    #[test]
    fn test_chat_request_missing_fields_default() {
        let request: ChatRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.message, "");
        assert!(request.session_id.is_none());

        let request: ChatRequest =
            serde_json::from_value(json!({"message": "Hello", "session_id": null})).unwrap();
        assert_eq!(request.message, "Hello");
        assert!(request.session_id.is_none());
    }
}
