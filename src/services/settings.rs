use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;

use super::store::KeyValueStore;
use crate::config::{DEFAULT_CONTEXT_SIZE, MIN_CONTEXT_SIZE};
use crate::models::settings::parse_context_size;
use crate::models::{SettingKey, Settings, ThemePreference};

/// Typed view over the persisted settings keys.
///
/// Holds the current snapshot in a watch channel; every successful or failed
/// write updates the snapshot so subscribers always see what the user chose.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn KeyValueStore>,
    current: Arc<watch::Sender<Settings>>,
}

impl SettingsService {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let settings = Self::read_all(store.as_ref()).await;
        let (tx, _rx) = watch::channel(settings);
        Self {
            store,
            current: Arc::new(tx),
        }
    }

    pub fn current(&self) -> Settings {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.current.subscribe()
    }

    /// Re-read every key from the store, replacing the snapshot.
    pub async fn reload(&self) -> Settings {
        let settings = Self::read_all(self.store.as_ref()).await;
        self.current.send_replace(settings.clone());
        settings
    }

    /// Read a single setting as its stored string form, or the default.
    pub fn get(&self, key: SettingKey) -> Option<String> {
        let s = self.current.borrow();
        match key {
            SettingKey::EndpointUrl => s.endpoint_url.clone(),
            SettingKey::ApiKey => s.api_key.clone(),
            SettingKey::ContextEnabled => Some(s.context_enabled.to_string()),
            SettingKey::ContextWindowSize => Some(s.context_window_size.to_string()),
            SettingKey::Theme => Some(s.theme.as_str().to_string()),
        }
    }

    /// Apply a raw setting change.
    ///
    /// Absent or empty values remove the stored entry, which restores the
    /// default on the next read. The context window size is the exception for
    /// present input: anything unusable coerces to the floor and is stored.
    pub async fn set(&self, key: SettingKey, value: Option<&str>) -> Result<Settings> {
        let value = value.filter(|v| !v.is_empty());

        let stored: Option<String> = match (key, value) {
            (_, None) => None,
            (SettingKey::EndpointUrl | SettingKey::ApiKey, Some(v)) => Some(v.to_string()),
            (SettingKey::ContextEnabled, Some(v)) => Some((v == "true").to_string()),
            (SettingKey::ContextWindowSize, Some(v)) => {
                Some(parse_context_size(v, MIN_CONTEXT_SIZE).to_string())
            }
            (SettingKey::Theme, Some(v)) => {
                Some(ThemePreference::from_stored(v).as_str().to_string())
            }
        };

        self.current
            .send_modify(|s| Self::apply(s, key, stored.as_deref()));

        let storage_key = key.storage_key();
        let result = match &stored {
            Some(v) => self.store.set(storage_key, v).await,
            None => self.store.remove(storage_key).await,
        };

        if let Err(e) = &result {
            tracing::warn!("Failed to save setting {}: {}", storage_key, e);
        }
        result.with_context(|| format!("Failed to save setting {}", storage_key))?;

        Ok(self.current())
    }

    pub async fn set_endpoint_url(&self, url: Option<&str>) -> Result<Settings> {
        self.set(SettingKey::EndpointUrl, url).await
    }

    pub async fn set_api_key(&self, api_key: Option<&str>) -> Result<Settings> {
        self.set(SettingKey::ApiKey, api_key).await
    }

    pub async fn set_context_enabled(&self, enabled: bool) -> Result<Settings> {
        self.set(SettingKey::ContextEnabled, Some(if enabled { "true" } else { "false" }))
            .await
    }

    pub async fn set_context_window_size(&self, size: i64) -> Result<Settings> {
        let raw = size.to_string();
        self.set(SettingKey::ContextWindowSize, Some(raw.as_str())).await
    }

    pub async fn set_theme(&self, theme: ThemePreference) -> Result<Settings> {
        self.set(SettingKey::Theme, Some(theme.as_str())).await
    }

    fn apply(settings: &mut Settings, key: SettingKey, stored: Option<&str>) {
        let defaults = Settings::default();
        match key {
            SettingKey::EndpointUrl => settings.endpoint_url = stored.map(str::to_string),
            SettingKey::ApiKey => settings.api_key = stored.map(str::to_string),
            SettingKey::ContextEnabled => {
                settings.context_enabled = stored.map_or(defaults.context_enabled, |v| v == "true")
            }
            SettingKey::ContextWindowSize => {
                settings.context_window_size =
                    stored.map_or(defaults.context_window_size, |v| {
                        parse_context_size(v, DEFAULT_CONTEXT_SIZE)
                    })
            }
            SettingKey::Theme => {
                settings.theme = stored.map_or(defaults.theme, ThemePreference::from_stored)
            }
        }
    }

    async fn read_all(store: &dyn KeyValueStore) -> Settings {
        let mut settings = Settings::default();
        for key in SettingKey::ALL {
            let raw = match store.get(key.storage_key()).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Failed to read setting {}: {}", key.storage_key(), e);
                    None
                }
            };
            let raw = raw.filter(|v| !v.is_empty());
            Self::apply(&mut settings, key, raw.as_deref());
        }
        settings
    }
}
