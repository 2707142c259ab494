//! TOML-based application configuration.
//!
//! Stores user preferences for session durations and completion alerts.
//! Configuration is stored at `~/.config/flowtimer/config.toml`; missing
//! files and missing fields fall back to defaults field by field.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::Durations;

/// Session duration configuration, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_flow_minutes")]
    pub flow_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
}

/// Completion-alert configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Alert volume, 0-100.
    #[serde(default = "default_volume")]
    pub volume: u32,
    /// Path to a custom alert sound file (optional).
    #[serde(default)]
    pub custom_sound: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/flowtimer/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_flow_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    30
}
fn default_true() -> bool {
    true
}
fn default_volume() -> u32 {
    100
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            flow_minutes: default_flow_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
            custom_sound: None,
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|err| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/flowtimer"),
            message: err.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk; a missing file writes and returns the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|message| {
                ConfigError::LoadFailed { path, message }
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|err| match err {
            ConfigError::LoadFailed { path, message } => ConfigError::SaveFailed { path, message },
            other => other,
        })?;
        let content = toml::to_string_pretty(self).map_err(|err| ConfigError::SaveFailed {
            path: path.clone(),
            message: err.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|err| ConfigError::SaveFailed {
            path,
            message: err.to_string(),
        })?;
        Ok(())
    }

    pub(crate) fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|err| err.to_string())
    }

    /// Configured durations in seconds, ready for the engine.
    pub fn durations(&self) -> Durations {
        Durations {
            flow: self.schedule.flow_minutes * 60,
            short_break: self.schedule.short_break_minutes * 60,
            long_break: self.schedule.long_break_minutes * 60,
        }
    }

    /// Alert volume as the 0.0-1.0 scale the notifier port expects.
    pub fn alert_volume(&self) -> f32 {
        (self.volume_clamped() as f32) / 100.0
    }

    fn volume_clamped(&self) -> u32 {
        self.notifications.volume.min(100)
    }
}
