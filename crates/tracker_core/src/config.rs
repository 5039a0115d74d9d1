//! Runtime configuration for tracker entry points.
//!
//! # Responsibility
//! - Resolve database path and logging settings from defaults and environment.
//! - Validate values before any connection or logger is opened.
//!
//! # Invariants
//! - An explicit log level is always a canonical level name.
//! - File logging targets an absolute directory; otherwise logs go to stderr.

use crate::logging::{log_dir_sink, normalize_level, LogSink};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "tracker.db";
pub const ENV_DB_PATH: &str = "PARCEL_TRACKER_DB";
pub const ENV_LOG_LEVEL: &str = "PARCEL_TRACKER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PARCEL_TRACKER_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    InvalidLogDir(String),
    EmptyDbPath,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) | Self::InvalidLogDir(message) => {
                write!(f, "{message}")
            }
            Self::EmptyDbPath => write!(f, "database path cannot be empty"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved settings for one tracker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub db_path: PathBuf,
    /// Explicit level; `None` falls back to the sink's default.
    pub log_level: Option<&'static str>,
    pub log_sink: LogSink,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: None,
            log_sink: LogSink::Stderr,
        }
    }
}

impl TrackerConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, falling back to defaults.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();
        if let Some(path) = value(ENV_DB_PATH) {
            config = config.with_db_path(path)?;
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config = config.with_log_level(&level)?;
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            config = config.with_log_dir(&dir)?;
        }
        Ok(config)
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }
        self.db_path = path;
        Ok(self)
    }

    pub fn with_log_level(mut self, level: &str) -> Result<Self, ConfigError> {
        self.log_level = Some(normalize_level(level).map_err(ConfigError::InvalidLogLevel)?);
        Ok(self)
    }

    /// Switches logging from stderr to rolling files in `dir`.
    pub fn with_log_dir(mut self, dir: &str) -> Result<Self, ConfigError> {
        self.log_sink = log_dir_sink(dir).map_err(ConfigError::InvalidLogDir)?;
        Ok(self)
    }

    /// Level the logger should start with.
    pub fn log_level(&self) -> &'static str {
        self.log_level
            .unwrap_or_else(|| self.log_sink.default_level())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, TrackerConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use crate::logging::LogSink;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = TrackerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("tracker.db"));
        assert_eq!(config.log_sink, LogSink::Stderr);
        assert_eq!(config.log_level(), "warn");
    }

    #[test]
    fn environment_overrides_defaults() {
        let log_dir = std::env::temp_dir();
        let log_dir_str = log_dir.to_str().unwrap();
        let config = TrackerConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/tracker/parcels.db"),
            (ENV_LOG_LEVEL, "Warning"),
            (ENV_LOG_DIR, log_dir_str),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/tracker/parcels.db"));
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.log_sink, LogSink::Files(log_dir));
    }

    #[test]
    fn file_sink_without_explicit_level_uses_build_default() {
        let config = TrackerConfig::default().with_log_dir("/var/log/tracker").unwrap();
        assert_eq!(config.log_level, None);
        assert_eq!(config.log_level(), config.log_sink.default_level());
        assert_ne!(config.log_level(), "warn");
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = TrackerConfig::from_lookup(lookup(&[(ENV_DB_PATH, "  ")])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("tracker.db"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = TrackerConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));

        let err = TrackerConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "logs")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogDir(_)));

        let err = TrackerConfig::default().with_db_path("").unwrap_err();
        assert_eq!(err, ConfigError::EmptyDbPath);
    }
}
