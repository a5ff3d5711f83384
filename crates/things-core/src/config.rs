use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::NamedList;
use crate::script::DEFAULT_APP_NAME;

pub const HOME_ENV: &str = "THINGS_CLI_HOME";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unknown config key '{0}'. Known keys: app_name, osascript_cmd, default_list")]
    UnknownKey(String),
    #[error(transparent)]
    Invalid(#[from] crate::command::ValidationError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingsConfig {
    /// Application addressed by `tell application`. Defaults to Things3.
    pub app_name: Option<String>,
    /// Command used instead of `osascript` on PATH (split shell-style).
    pub osascript_cmd: Option<String>,
    /// List new to-dos go to when `add` gets no target.
    pub default_list: Option<String>,
}

impl ThingsConfig {
    pub fn app_name(&self) -> &str {
        self.app_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_APP_NAME)
    }

    /// Sets one key from its textual form. An empty value clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match key {
            "app_name" => self.app_name = value,
            "osascript_cmd" => self.osascript_cmd = value,
            "default_list" => {
                if let Some(list) = &value {
                    list.parse::<NamedList>()?;
                }
                self.default_list = value;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    for key in ["HOME", "USERPROFILE"] {
        if let Ok(value) = std::env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
    }
    None
}

pub fn resolve_things_home_dir() -> Option<PathBuf> {
    if let Ok(value) = std::env::var(HOME_ENV) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir().map(|home| home.join(".things-cli"))
}

pub fn default_config_path() -> Option<PathBuf> {
    resolve_things_home_dir().map(|home| home.join("config.toml"))
}

/// `Ok(None)` when the file does not exist.
pub fn load_config(path: &Path) -> Result<Option<ThingsConfig>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    Ok(Some(toml::from_str::<ThingsConfig>(&text)?))
}

pub fn write_config(path: &Path, config: &ThingsConfig) -> Result<PathBuf, ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}
