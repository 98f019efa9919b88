pub mod chat;
pub mod conversation;
pub mod database;
pub mod settings;
pub mod store;

pub use conversation::ConversationStore;
pub use database::Database;
pub use settings::SettingsService;
pub use store::{KeyValueStore, MemoryStore};
