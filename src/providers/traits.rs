use async_trait::async_trait;

use crate::models::{Message, Settings};

/// Produces the assistant reply for the latest user message.
///
/// Implementations never fail: every error is absorbed into some reply text.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn get_reply(
        &self,
        conversation: &[Message],
        last_user_text: &str,
        settings: &Settings,
    ) -> String;
}
