//! Runtime configuration.
//!
//! # Responsibility
//! - Hold the target timezone, database location and logging settings.
//! - Load them from a TOML file and `CHIME_*` environment overrides.
//!
//! # Invariants
//! - The timezone is configuration; scheduling code never embeds one.
//! - The occurrence slot capacity is a protocol constant and is not
//!   configurable here.

use crate::logging::default_log_level;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_TIMEZONE: &str = "America/Chicago";
const APP_DIR_NAME: &str = "chime";
const DB_FILE_NAME: &str = "chime.sqlite3";

pub const ENV_TIMEZONE: &str = "CHIME_TIMEZONE";
pub const ENV_DB_PATH: &str = "CHIME_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CHIME_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CHIME_LOG_DIR";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    UnknownTimezone(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::UnknownTimezone(name) => write!(f, "unknown timezone `{name}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::UnknownTimezone(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Chime runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChimeConfig {
    /// IANA timezone in which reminder times of day are interpreted.
    pub timezone: String,
    pub db_path: PathBuf,
    pub log_level: String,
    /// Must be absolute for logging to start.
    pub log_dir: PathBuf,
}

impl Default for ChimeConfig {
    fn default() -> Self {
        let app_dir = dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR_NAME}")));

        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            db_path: app_dir.join(DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: app_dir.join("logs"),
        }
    }
}

impl ChimeConfig {
    /// Loads configuration from a TOML file; missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Defaults overlaid with `CHIME_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Optional file, then environment overrides, then timezone check.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.timezone()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`, ignoring blank values.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(timezone) = value(ENV_TIMEZONE) {
            self.timezone = timezone.trim().to_string();
        }
        if let Some(path) = value(ENV_DB_PATH) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(dir);
        }
    }

    /// Parses the configured timezone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }
}
