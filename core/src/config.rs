//! Configuration for whisper-json.
//!
//! Loads an optional TOML config file controlling the models directory
//! and the default log level. A missing file yields defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use xdg::BaseDirectories;

const APP_NAME: &str = "whisper-json";

/// Errors from locating or parsing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine {kind} directory (HOME not set?)")]
    MissingBaseDir { kind: &'static str },
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file as TOML")]
    Parse(#[from] toml::de::Error),
}

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub models: ModelsConfig,
    pub logging: LoggingConfig,
}

/// Model storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding downloaded model weights.
    /// Defaults to `~/.local/share/whisper-json/models/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: LogLevel,
}

/// Log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to a tracing filter directive string for the engine crate.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "whisper_json_core=error",
            LogLevel::Warn => "whisper_json_core=warn",
            LogLevel::Info => "whisper_json_core=info",
            LogLevel::Debug => "whisper_json_core=debug",
            LogLevel::Trace => "whisper_json_core=trace",
        }
    }
}

fn base_dirs() -> BaseDirectories {
    BaseDirectories::with_prefix(APP_NAME)
}

impl Config {
    /// Returns the default config directory path.
    /// `~/.config/whisper-json/` (or `$XDG_CONFIG_HOME/whisper-json/`)
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        base_dirs()
            .get_config_home()
            .ok_or(ConfigError::MissingBaseDir { kind: "config" })
    }

    /// Returns the default config file path.
    /// `~/.config/whisper-json/config.toml`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Returns the default data directory path.
    /// `~/.local/share/whisper-json/` (or `$XDG_DATA_HOME/whisper-json/`)
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        base_dirs()
            .get_data_home()
            .ok_or(ConfigError::MissingBaseDir { kind: "data" })
    }

    /// Returns the default models directory path.
    /// `~/.local/share/whisper-json/models/`
    pub fn default_models_dir() -> Result<PathBuf, ConfigError> {
        Self::data_dir().map(|p| p.join("models"))
    }

    /// Returns the models directory, honoring the `[models] dir` override.
    pub fn models_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.models.dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_models_dir(),
        }
    }

    /// Load configuration from the default path.
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
