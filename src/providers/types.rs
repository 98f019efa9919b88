use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ECHO_PREFIX;
use crate::models::{Message, Role};

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed with HTTP {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ResponderError {
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ResponderError::Timeout
        } else {
            ResponderError::Network(e.to_string())
        }
    }
}

/// One conversational turn in the shape the remote service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ChatTurn {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.text.clone(),
        }
    }
}

/// Project the trailing `window` messages into transport turns, oldest first.
pub fn context_window(conversation: &[Message], window: usize) -> Vec<ChatTurn> {
    let start = conversation.len().saturating_sub(window);
    conversation[start..].iter().map(ChatTurn::from).collect()
}

/// The deterministic local reply used when no remote answer is available.
pub fn echo_reply(text: &str) -> String {
    format!("{}{}", ECHO_PREFIX, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageIds;

    #[test]
    fn test_context_window_keeps_latest_in_order() {
        let ids = MessageIds::new();
        let conversation: Vec<Message> = (0..8)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                Message::new(&ids, role, format!("m{}", i))
            })
            .collect();

        let turns = context_window(&conversation, 3);
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m5", "m6", "m7"]);
        assert_eq!(turns[0].role, Role::Assistant);
    }

    #[test]
    fn test_context_window_larger_than_conversation() {
        let ids = MessageIds::new();
        let conversation = vec![Message::new(&ids, Role::User, "only")];
        assert_eq!(context_window(&conversation, 30).len(), 1);
    }

    #[test]
    fn test_turn_serializes_role_lowercase() {
        let turn = ChatTurn {
            role: Role::Assistant,
            content: "hi".to_string(),
        };
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn test_echo_reply() {
        assert_eq!(echo_reply("hello"), "Echo: hello");
    }
}
