use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the author of a chat message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation.
    System,

    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a conversation.
///
/// Messages are immutable once built; the fields are only reachable through
/// accessors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    /// Create a new `ChatMessage` with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new system `ChatMessage`.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a new user `ChatMessage`.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant `ChatMessage`.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// The author of the message.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The text of the message.
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn chat_message_serialization() {
        let message = ChatMessage::user("Hello");
        assert_eq!(
            to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": "Hello"
            })
        );
    }

    #[test]
    fn constructors_set_role() {
        assert_eq!(ChatMessage::system("s").role(), Role::System);
        assert_eq!(ChatMessage::user("u").role(), Role::User);
        assert_eq!(ChatMessage::assistant("a").role(), Role::Assistant);
        assert_eq!(ChatMessage::assistant("a").content(), "a");
    }
}
