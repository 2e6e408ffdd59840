//! Storage settings file.
//!
//! Settings are plain data passed to whoever needs them; nothing here is
//! process-wide. The JSON form is versioned so older readers can refuse
//! files they do not understand.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EnviError, Result};
use crate::image::OpenOptions;

/// Log level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    #[default]
    Warn,
    /// Show errors, warnings, and info messages
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get all log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
pub const CONFIG_VERSION: u32 = 1;

/// Settings for opening images and for the command-line tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Version of the configuration file format
    pub version: u32,
    /// Log verbosity
    pub log_level: LogLevel,
    /// Options used when opening images
    pub open: OpenOptions,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            open: OpenOptions::default(),
        }
    }
}

impl StorageConfig {
    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.version > CONFIG_VERSION {
            return Err(EnviError::ConfigVersion {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write a configuration file.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ElementEncoding;

    #[test]
    fn test_config_roundtrip() {
        let config = StorageConfig {
            log_level: LogLevel::Debug,
            open: OpenOptions::virtualized().as_type(ElementEncoding::Float32),
            ..StorageConfig::default()
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"debug\""));
        assert_eq!(StorageConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = StorageConfig::from_json(r#"{"open": {"use_bbl": true}}"#).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert!(config.open.use_bbl);
        assert!(!config.open.sort_wavelengths);
    }

    #[test]
    fn test_version_too_new() {
        let json = format!(r#"{{"version": {}}}"#, CONFIG_VERSION + 1);
        assert!(matches!(
            StorageConfig::from_json(&json),
            Err(EnviError::ConfigVersion { .. })
        ));
    }

    #[test]
    fn test_log_level_filters() {
        assert_eq!(LogLevel::all().len(), 5);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envi.json");
        let config = StorageConfig::default();
        config.save(&path).unwrap();
        assert_eq!(StorageConfig::load(&path).unwrap(), config);
    }
}
