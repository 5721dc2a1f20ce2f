//! Observable, persisted state stores.
//! This crate owns the store invariants; UI bindings only subscribe and call mutators.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;

pub use config::{ConfigError, CoreConfig, LoggingConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::counter::CounterState;
pub use model::preferences::{Theme, UserPreferences};
pub use model::task::{Task, TaskId, TaskState};
pub use service::app_stores::{AppStores, AppStoresError, AppStoresResult};
pub use service::counter_store::CounterStore;
pub use service::task_store::TaskStore;
pub use service::user_store::UserStore;
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError, StorageResult};
pub use store::{
    JsonPersistence, PersistOptions, Snapshot, SnapshotPersistence, Store, StoreState,
    Subscription,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
