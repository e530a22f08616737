//! Last-used settings kept between sessions

use crate::config::persistence::{KeyValueStore, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Fixed keys under which settings are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    FileName,
    RemoveHeaders,
    ConfigText,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [
        SettingKey::FileName,
        SettingKey::RemoveHeaders,
        SettingKey::ConfigText,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::FileName => "config-to-csv-file-name",
            SettingKey::RemoveHeaders => "config-to-csv-remove-headers",
            SettingKey::ConfigText => "config-to-csv-config",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User settings restored at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Export file name as typed by the user, possibly blank
    pub file_name: String,
    /// Omit the header line from exported CSV
    pub remove_headers: bool,
    /// Raw form configuration text
    pub config_text: String,
}

impl Settings {
    /// Read all settings, falling back to defaults for missing or unreadable values.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            file_name: read_or_default(store, SettingKey::FileName),
            remove_headers: read_or_default(store, SettingKey::RemoveHeaders),
            config_text: read_or_default(store, SettingKey::ConfigText),
        }
    }

    /// JSON value of one setting.
    pub fn value_of(&self, key: SettingKey) -> Value {
        match key {
            SettingKey::FileName => Value::String(self.file_name.clone()),
            SettingKey::RemoveHeaders => Value::Bool(self.remove_headers),
            SettingKey::ConfigText => Value::String(self.config_text.clone()),
        }
    }

    /// Write every setting to the store.
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        for key in SettingKey::ALL {
            write_setting(store, key, &self.value_of(key))?;
        }
        Ok(())
    }

    /// Remove every setting from the store.
    pub fn clear(store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        for key in SettingKey::ALL {
            store.remove(key.as_str())?;
        }
        Ok(())
    }
}

pub fn write_setting(
    store: &mut dyn KeyValueStore,
    key: SettingKey,
    value: &Value,
) -> Result<(), StoreError> {
    store.set(key.as_str(), serde_json::to_string(value)?)
}

fn read_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: SettingKey) -> T {
    let raw = match store.get(key.as_str()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!("Failed to read setting {}: {}", key, e);
            return T::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!("Ignoring malformed setting {}: {}", key, e);
        T::default()
    })
}
