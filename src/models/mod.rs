pub mod message;
pub mod settings;

pub use message::{Message, MessageIds, Role};
pub use settings::{SettingKey, Settings, ThemePreference};
