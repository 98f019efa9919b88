use serde::{Deserialize, Serialize};

use crate::config::{
    API_KEY_STORAGE_KEY, BACKEND_URL_STORAGE_KEY, CONTEXT_ENABLED_STORAGE_KEY,
    CONTEXT_SIZE_STORAGE_KEY, DEFAULT_CONTEXT_ENABLED, DEFAULT_CONTEXT_SIZE, MAX_CONTEXT_SIZE,
    MIN_CONTEXT_SIZE, THEME_STORAGE_KEY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }

    pub fn from_stored(s: &str) -> Self {
        if s == "dark" {
            ThemePreference::Dark
        } else {
            ThemePreference::Light
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, ThemePreference::Dark)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    EndpointUrl,
    ApiKey,
    ContextEnabled,
    ContextWindowSize,
    Theme,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::EndpointUrl,
        SettingKey::ApiKey,
        SettingKey::ContextEnabled,
        SettingKey::ContextWindowSize,
        SettingKey::Theme,
    ];

    pub fn storage_key(&self) -> &'static str {
        match self {
            SettingKey::EndpointUrl => BACKEND_URL_STORAGE_KEY,
            SettingKey::ApiKey => API_KEY_STORAGE_KEY,
            SettingKey::ContextEnabled => CONTEXT_ENABLED_STORAGE_KEY,
            SettingKey::ContextWindowSize => CONTEXT_SIZE_STORAGE_KEY,
            SettingKey::Theme => THEME_STORAGE_KEY,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub endpoint_url: Option<String>,
    pub api_key: Option<String>,
    pub context_enabled: bool,
    pub context_window_size: u32,
    pub theme: ThemePreference,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            api_key: None,
            context_enabled: DEFAULT_CONTEXT_ENABLED,
            context_window_size: DEFAULT_CONTEXT_SIZE,
            theme: ThemePreference::default(),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("endpoint_url", &self.endpoint_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("context_enabled", &self.context_enabled)
            .field("context_window_size", &self.context_window_size)
            .field("theme", &self.theme)
            .finish()
    }
}

/// Clamp a context window size into `[MIN_CONTEXT_SIZE, MAX_CONTEXT_SIZE]`.
pub fn clamp_context_size(value: i64) -> u32 {
    value.clamp(MIN_CONTEXT_SIZE as i64, MAX_CONTEXT_SIZE as i64) as u32
}

/// Parse a context window size, truncating fractions and clamping.
///
/// Anything that is not a non-zero finite number yields `fallback`: the floor
/// for user input, the default for stored values.
pub fn parse_context_size(raw: &str, fallback: u32) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n != 0.0 => clamp_context_size(n.trunc() as i64),
        _ => fallback,
    }
}
