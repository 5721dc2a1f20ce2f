//! SQLite bootstrap for the durable key/value medium.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for snapshot storage.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Storage code must not touch `kv_store` before migrations succeed.
//! - Failures surface as `StorageError`; SQLite is only one storage backend.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
