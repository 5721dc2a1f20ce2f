//! Application-owned store context.
//!
//! # Responsibility
//! - Build the three stores once, over one shared storage medium.
//! - Be passed by reference to whatever needs store access.

use crate::config::{ConfigError, ConfigResult, CoreConfig};
use crate::service::counter_store::CounterStore;
use crate::service::task_store::TaskStore;
use crate::service::user_store::UserStore;
use crate::storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError};
use crate::store::PersistOptions;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type AppStoresResult<T> = Result<T, AppStoresError>;

/// Failure while assembling the store context.
#[derive(Debug)]
pub enum AppStoresError {
    Config(ConfigError),
    Storage(StorageError),
}

impl Display for AppStoresError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppStoresError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppStoresError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StorageError> for AppStoresError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// The single set of stores owned by the application root.
pub struct AppStores {
    pub tasks: TaskStore,
    pub preferences: UserStore,
    pub counter: CounterStore,
}

impl AppStores {
    /// Builds stores over `storage` using keys and version from `config`.
    ///
    /// # Errors
    /// - Returns `ConfigError` when `config` is invalid. Two stores sharing
    ///   one key would overwrite each other's snapshot.
    pub fn new(storage: Rc<dyn KeyValueStorage>, config: &CoreConfig) -> ConfigResult<Self> {
        config.validate().map_err(|err| {
            error!("event=stores_ready module=service status=error error={err}");
            err
        })?;
        let task_options = PersistOptions::new(config.task_storage_key.as_str())
            .with_version(config.persist_version);
        let user_options = PersistOptions::new(config.user_storage_key.as_str())
            .with_version(config.persist_version);

        let stores = Self {
            tasks: TaskStore::new(storage.clone(), task_options),
            preferences: UserStore::new(storage, user_options),
            counter: CounterStore::new(),
        };
        info!(
            "event=stores_ready module=service status=ok tasks={} theme={}",
            stores.tasks.get_state().tasks.len(),
            stores.preferences.get_state().theme
        );
        Ok(stores)
    }

    /// Opens the configured medium: the SQLite file at `db_path`, or an
    /// in-process map when none is set.
    ///
    /// # Errors
    /// - Returns `AppStoresError::Config` when `config` is invalid.
    /// - Returns `AppStoresError::Storage` when the database cannot be opened
    ///   or migrated.
    pub fn open(config: &CoreConfig) -> AppStoresResult<Self> {
        config.validate()?;
        let storage: Rc<dyn KeyValueStorage> = match &config.db_path {
            Some(path) => Rc::new(SqliteStorage::open(path)?),
            None => Rc::new(MemoryStorage::new()),
        };
        Ok(Self::new(storage, config)?)
    }
}
