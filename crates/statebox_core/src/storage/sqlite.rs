//! SQLite-backed key/value storage over the `kv_store` table.

use super::{KeyValueStorage, StorageResult};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Key/value storage persisted in a migrated SQLite database.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Wraps a connection that already went through `open_db*` bootstrap.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Exposes the underlying connection for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStorage for SqliteStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        debug!(
            "event=kv_write module=storage status=ok key={key} bytes={}",
            value.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStorage;
    use crate::db::open_db;
    use crate::storage::{KeyValueStorage, StorageError};
    use rusqlite::{Connection, OpenFlags};

    #[test]
    fn read_missing_key_returns_none() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.read("absent").unwrap(), None);
    }

    #[test]
    fn write_upserts_single_row() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.write("task-storage", "{\"a\":1}").unwrap();
        storage.write("task-storage", "{\"a\":2}").unwrap();

        assert_eq!(
            storage.read("task-storage").unwrap().as_deref(),
            Some("{\"a\":2}")
        );
        let rows: i64 = storage
            .connection()
            .query_row("SELECT COUNT(*) FROM kv_store;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn read_only_database_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statebox.sqlite3");
        drop(open_db(&path).unwrap());

        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
        let storage = SqliteStorage::new(conn);
        assert_eq!(storage.read("task-storage").unwrap(), None);

        let err = storage.write("task-storage", "{}").unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)), "got {err}");
    }

    #[test]
    fn remove_deletes_value() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.write("user-preferences", "{}").unwrap();
        storage.remove("user-preferences").unwrap();
        assert_eq!(storage.read("user-preferences").unwrap(), None);
    }
}
