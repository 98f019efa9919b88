use std::time::Duration;

// Persisted keys. Each one is owned by exactly one store.
pub const CHAT_STORAGE_KEY: &str = "chat_messages";
pub const API_KEY_STORAGE_KEY: &str = "api_key";
pub const BACKEND_URL_STORAGE_KEY: &str = "backend_url";
pub const CONTEXT_ENABLED_STORAGE_KEY: &str = "context_enabled";
pub const CONTEXT_SIZE_STORAGE_KEY: &str = "context_size";
pub const THEME_STORAGE_KEY: &str = "theme";

pub const DEFAULT_CONTEXT_ENABLED: bool = true;
pub const DEFAULT_CONTEXT_SIZE: u32 = 6;
pub const MIN_CONTEXT_SIZE: u32 = 1;
pub const MAX_CONTEXT_SIZE: u32 = 30;

/// Simulated latency before a local echo reply is returned.
pub const FALLBACK_DELAY: Duration = Duration::from_millis(600);
pub const ECHO_PREFIX: &str = "Echo: ";

/// Header carrying the stored API key on outbound requests.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Upper bound on one `/chat` round trip before falling back to the echo.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
