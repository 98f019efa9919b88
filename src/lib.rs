//! Message exchange and persistence core for a chat client.
//!
//! A [`ChatSession`] turns user text into a persisted conversation, asks a
//! [`Responder`] for the reply and appends it. The presentation layer only
//! reads observable state and forwards intent.

pub mod config;
pub mod models;
pub mod providers;
pub mod services;

use tracing_subscriber::EnvFilter;

pub use models::{Message, Role, SettingKey, Settings, ThemePreference};
pub use providers::{RemoteResponder, Responder};
pub use services::chat::{ChatEvent, ChatSession};
pub use services::{ConversationStore, Database, KeyValueStore, MemoryStore, SettingsService};

/// Install a `RUST_LOG`-driven fmt subscriber. Does nothing if the host
/// application already installed one.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
