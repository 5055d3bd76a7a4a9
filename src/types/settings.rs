use serde::{Deserialize, Serialize};

use crate::types::errors::SettingsError;

/// Bounds for `network.request_timeout_secs`.
pub const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=120;

/// Top-level application settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub file_access: FileAccessSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub network: NetworkSettings,
}

impl AppSettings {
    /// Rejects values the rest of the tool cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let key = &self.storage.data_key;
        if key.trim().is_empty() || key.chars().any(char::is_whitespace) {
            return Err(SettingsError::InvalidValue(format!(
                "storage.data_key must be a non-empty word, got {:?}",
                key
            )));
        }
        if self.storage.database_file.trim().is_empty() {
            return Err(SettingsError::InvalidValue("storage.database_file is empty".to_string()));
        }
        if !self.file_access.suggested_file_name.to_ascii_lowercase().ends_with(".json") {
            return Err(SettingsError::InvalidValue(format!(
                "file_access.suggested_file_name must end in .json, got {:?}",
                self.file_access.suggested_file_name
            )));
        }
        let timeout = self.network.request_timeout_secs;
        if !TIMEOUT_RANGE_SECS.contains(&timeout) {
            return Err(SettingsError::InvalidValue(format!(
                "network.request_timeout_secs must be within {}..={}, got {}",
                TIMEOUT_RANGE_SECS.start(),
                TIMEOUT_RANGE_SECS.end(),
                timeout
            )));
        }
        Ok(())
    }
}

/// Where the local mirror lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Key of the JSON snapshot in the local key/value table.
    pub data_key: String,
    /// SQLite file name inside the data directory.
    pub database_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_key: "bookmark-tool-data".to_string(),
            database_file: "bookmark-tool.db".to_string(),
        }
    }
}

/// Behaviour of the authorized external file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileAccessSettings {
    pub suggested_file_name: String,
    /// Handles revived in a later session start out granted instead of needing a re-prompt.
    pub remember_grants: bool,
}

impl Default for FileAccessSettings {
    fn default() -> Self {
        Self {
            suggested_file_name: "bookmarks.json".to_string(),
            remember_grants: true,
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Forces `debug` level regardless of `level`.
    pub debug: bool,
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            debug: false,
            level: "info".to_string(),
        }
    }
}

/// Limits for best-effort network lookups (page titles, favicons).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSettings {
    pub request_timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 5,
        }
    }
}
