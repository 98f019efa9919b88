use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::models::{ChatRequestBody, ChatResponseBody};
use crate::config::{API_KEY_HEADER, FALLBACK_DELAY, REQUEST_TIMEOUT};
use crate::models::{Message, Settings};
use crate::providers::traits::Responder;
use crate::providers::types::{context_window, echo_reply, ResponderError};

/// Talks to the user-configured `/chat` endpoint, falling back to a local
/// echo whenever no endpoint is set or the call fails.
pub struct RemoteResponder {
    client: Client,
    request_timeout: Duration,
    fallback_delay: Duration,
}

impl RemoteResponder {
    pub fn new() -> Self {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build();

        let client = match client {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to create HTTP client, using defaults: {}", e);
                Client::default()
            }
        };

        Self::with_client(client)
    }

    /// Use a caller-supplied client. Requests still carry the responder's
    /// own timeout.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            request_timeout: REQUEST_TIMEOUT,
            fallback_delay: FALLBACK_DELAY,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    fn chat_url(endpoint: &str) -> Result<Url, ResponderError> {
        let url = Url::parse(&format!("{}/chat", endpoint.trim_end_matches('/')))
            .map_err(|e| ResponderError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ResponderError::InvalidEndpoint(format!(
                "unsupported scheme {}",
                other
            ))),
        }
    }

    fn build_body<'a>(
        conversation: &[Message],
        last_user_text: &'a str,
        settings: &Settings,
    ) -> ChatRequestBody<'a> {
        if settings.context_enabled {
            ChatRequestBody::Context {
                messages: context_window(conversation, settings.context_window_size as usize),
            }
        } else {
            ChatRequestBody::Single {
                message: last_user_text,
            }
        }
    }

    /// Exactly one network attempt; no retry.
    async fn request_reply(
        &self,
        endpoint: &str,
        conversation: &[Message],
        last_user_text: &str,
        settings: &Settings,
    ) -> Result<String, ResponderError> {
        let url = Self::chat_url(endpoint)?;
        let body = Self::build_body(conversation, last_user_text, settings);

        let mut req = self
            .client
            .post(url)
            .timeout(self.request_timeout)
            .header("content-type", "application/json")
            .json(&body);

        if let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            req = req.header(API_KEY_HEADER, key);
        }

        tracing::debug!(
            "Sending chat request (context: {})",
            settings.context_enabled
        );

        let response = req
            .send()
            .await
            .map_err(ResponderError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ResponderError::Status(response.status().as_u16()));
        }

        let parsed: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResponderError::Timeout
                } else {
                    ResponderError::InvalidResponse(e.to_string())
                }
            })?;

        parsed
            .into_text()
            .ok_or_else(|| ResponderError::InvalidResponse("missing response field".to_string()))
    }

    async fn fallback(&self, last_user_text: &str) -> String {
        tokio::time::sleep(self.fallback_delay).await;
        echo_reply(last_user_text)
    }
}

impl Default for RemoteResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Responder for RemoteResponder {
    async fn get_reply(
        &self,
        conversation: &[Message],
        last_user_text: &str,
        settings: &Settings,
    ) -> String {
        if let Some(endpoint) = settings.endpoint_url.as_deref().filter(|u| !u.is_empty()) {
            match self
                .request_reply(endpoint, conversation, last_user_text, settings)
                .await
            {
                Ok(reply) => return reply,
                Err(e) => tracing::warn!("Backend failed, falling back: {}", e),
            }
        }

        self.fallback(last_user_text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_strips_trailing_slashes() {
        let url = RemoteResponder::chat_url("https://api.example.com/v1//").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/chat");

        let url = RemoteResponder::chat_url("http://localhost:8080").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/chat");
    }

    #[test]
    fn test_chat_url_rejects_garbage() {
        assert!(matches!(
            RemoteResponder::chat_url("not a url"),
            Err(ResponderError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            RemoteResponder::chat_url("ftp://files.example.com"),
            Err(ResponderError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_endpoint_echoes_after_delay() {
        let responder = RemoteResponder::new();
        let start = tokio::time::Instant::now();

        let reply = responder
            .get_reply(&[], "hello", &Settings::default())
            .await;

        assert_eq!(reply, "Echo: hello");
        assert!(start.elapsed() >= FALLBACK_DELAY);
    }

    #[tokio::test]
    async fn test_invalid_endpoint_falls_back() {
        let responder = RemoteResponder::new().with_fallback_delay(Duration::ZERO);
        let settings = Settings {
            endpoint_url: Some("::::".to_string()),
            ..Settings::default()
        };
        let reply = responder.get_reply(&[], "hi", &settings).await;
        assert_eq!(reply, "Echo: hi");
    }
}
