use serde::{Deserialize, Serialize};

use crate::providers::types::ChatTurn;

// --- Request types ---

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChatRequestBody<'a> {
    Context { messages: Vec<ChatTurn> },
    Single { message: &'a str },
}

// --- Response types ---

#[derive(Debug, Deserialize)]
pub struct ChatResponseBody {
    #[serde(default)]
    pub response: Option<serde_json::Value>,
}

impl ChatResponseBody {
    /// The reply text, if the service returned a non-empty string.
    pub fn into_text(self) -> Option<String> {
        match self.response {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}
