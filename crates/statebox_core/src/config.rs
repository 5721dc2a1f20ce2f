//! Runtime configuration for the store layer.
//!
//! # Responsibility
//! - Hold storage keys, the database location and logging settings.
//! - Load overrides from JSON documents or `STATEBOX_*` environment variables.
//!
//! # Invariants
//! - Persisted stores use non-empty, distinct storage keys.
//! - The log level is one of `trace|debug|info|warn|error`.

use crate::logging::{default_log_level, normalize_level};
use crate::store::DEFAULT_PERSIST_VERSION;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_TASK_STORAGE_KEY: &str = "task-storage";
pub const DEFAULT_USER_STORAGE_KEY: &str = "user-preferences";

pub const ENV_DB_PATH: &str = "STATEBOX_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "STATEBOX_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STATEBOX_LOG_DIR";

/// Top-level configuration consumed by `AppStores::open`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file backing persisted stores; `None` keeps them in memory.
    pub db_path: Option<PathBuf>,
    pub task_storage_key: String,
    pub user_storage_key: String,
    /// Envelope version written and expected by persisted stores.
    pub persist_version: u32,
    pub logging: LoggingConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            task_storage_key: DEFAULT_TASK_STORAGE_KEY.to_string(),
            user_storage_key: DEFAULT_USER_STORAGE_KEY.to_string(),
            persist_version: DEFAULT_PERSIST_VERSION,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    EmptyStorageKey(&'static str),
    DuplicateStorageKey(String),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid config document: {err}"),
            Self::EmptyStorageKey(field) => write!(f, "`{field}` must not be empty"),
            Self::DuplicateStorageKey(key) => {
                write!(f, "task and user stores cannot share storage key `{key}`")
            }
            Self::InvalidLogLevel(level) => write!(f, "unsupported log level `{level}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl CoreConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `STATEBOX_*` process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values returned by `lookup`.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.logging.log_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.task_storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey("task_storage_key"));
        }
        if self.user_storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey("user_storage_key"));
        }
        if self.task_storage_key == self.user_storage_key {
            return Err(ConfigError::DuplicateStorageKey(
                self.task_storage_key.clone(),
            ));
        }
        normalize_level(&self.logging.level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.logging.level.clone()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn defaults_use_documented_storage_keys() {
        let config = CoreConfig::default();
        assert_eq!(config.task_storage_key, "task-storage");
        assert_eq!(config.user_storage_key, "user-preferences");
        assert_eq!(config.persist_version, 0);
        assert!(config.db_path.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn from_lookup_overlays_environment() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PATH, "/tmp/statebox.db"),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_DIR, "  "),
        ]);
        let config =
            CoreConfig::from_lookup(|name| env.get(name).map(|value| value.to_string())).unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/statebox.db")));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.log_dir, None);
    }

    #[test]
    fn from_lookup_rejects_unknown_level() {
        let err = CoreConfig::from_lookup(|name| {
            (name == ENV_LOG_LEVEL).then(|| "chatty".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(level) if level == "chatty"));
    }

    #[test]
    fn from_json_str_keeps_defaults_for_missing_fields() {
        let config = CoreConfig::from_json_str(
            r#"{"task_storage_key": "tasks-v2", "persist_version": 3}"#,
        )
        .unwrap();
        assert_eq!(config.task_storage_key, "tasks-v2");
        assert_eq!(config.user_storage_key, "user-preferences");
        assert_eq!(config.persist_version, 3);
    }

    #[test]
    fn from_json_str_rejects_shared_keys() {
        let err = CoreConfig::from_json_str(
            r#"{"task_storage_key": "same", "user_storage_key": "same"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateStorageKey(_)));
    }
}
