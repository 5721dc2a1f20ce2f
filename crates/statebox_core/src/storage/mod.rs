//! Durable key/value medium used by snapshot persistence.
//!
//! # Responsibility
//! - Define the `read`/`write`/`remove` contract persistence relies on.
//! - Provide SQLite-backed and in-process implementations.
//!
//! # Invariants
//! - `write` fully overwrites any previous value under the same key.
//! - `read` of a never-written or removed key returns `Ok(None)`.
//! - Callers treat every error as advisory; the medium is not assumed reliable.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a key/value storage backend.
#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    /// The database was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The medium refused the operation: disk full, read-only, quota exceeded.
    ///
    /// `SqliteStorage` reports `SQLITE_FULL` and `SQLITE_READONLY` this way;
    /// other backends use it for their own capacity or permission refusals.
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite storage error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "storage schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::DiskFull | ErrorCode::ReadOnly) => Self::Unavailable(value.to_string()),
            _ => Self::Sqlite(value),
        }
    }
}

/// Raw string key/value medium.
pub trait KeyValueStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}
