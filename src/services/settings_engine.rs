// Bookmark tool Settings Engine
// Reads and writes `settings.json` and applies single-key updates from RPC.
// Every accepted state passes `AppSettings::validate`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings held in memory and mirrored to a JSON file.
pub struct SettingsEngine {
    config_path: String,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Uses `path_override` when given, else `settings.json` in the platform
    /// config directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .into_owned()
        });
        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }

    /// Loads settings, keeping defaults when the file is unreadable or invalid.
    pub fn load_or_default(&mut self) -> AppSettings {
        match self.load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %self.config_path, error = %e, "Settings unusable, using defaults");
                self.settings = AppSettings::default();
                self.settings.clone()
            }
        }
    }
}

fn expect_bool(key: &str, value: &Value) -> Result<bool, SettingsError> {
    value
        .as_bool()
        .ok_or_else(|| SettingsError::InvalidValue(format!("{} expects a boolean, got {}", key, value)))
}

fn expect_string(key: &str, value: &Value) -> Result<String, SettingsError> {
    value
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| SettingsError::InvalidValue(format!("{} expects a string, got {}", key, value)))
}

fn expect_u64(key: &str, value: &Value) -> Result<u64, SettingsError> {
    value
        .as_u64()
        .ok_or_else(|| SettingsError::InvalidValue(format!("{} expects a whole number, got {}", key, value)))
}

impl SettingsEngineTrait for SettingsEngine {
    /// A missing file yields defaults. An unreadable, malformed or invalid
    /// file is an error and leaves the in-memory settings untouched.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        let content = match fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.settings = AppSettings::default();
                return Ok(self.settings.clone());
            }
            Err(e) => {
                return Err(SettingsError::IoError(format!("Failed to read config file: {}", e)));
            }
        };

        let settings: AppSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        settings.validate()?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }
        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;
        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Updates one setting by its dotted name (`"logging.debug"`,
    /// `"network.request_timeout_secs"`, ...) and saves. A rejected value
    /// leaves both memory and disk unchanged.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut next = self.settings.clone();
        match key {
            "storage.data_key" => next.storage.data_key = expect_string(key, &value)?,
            "storage.database_file" => next.storage.database_file = expect_string(key, &value)?,
            "file_access.suggested_file_name" => {
                next.file_access.suggested_file_name = expect_string(key, &value)?
            }
            "file_access.remember_grants" => {
                next.file_access.remember_grants = expect_bool(key, &value)?
            }
            "logging.debug" => next.logging.debug = expect_bool(key, &value)?,
            "logging.level" => next.logging.level = expect_string(key, &value)?,
            "network.request_timeout_secs" => {
                next.network.request_timeout_secs = expect_u64(key, &value)?
            }
            _ => return Err(SettingsError::InvalidKey(format!("Key '{}' not found in settings", key))),
        }
        next.validate()?;

        self.settings = next;
        self.save()?;
        info!(key, "Setting updated");
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
