//! Snapshot persistence over a key/value medium.
//!
//! # Responsibility
//! - Serialize snapshots as a versioned JSON envelope under one key.
//! - Rehydrate snapshots, failing open on any problem.
//!
//! # Invariants
//! - Stored layout is `{"state": <record>, "version": <n>}`.
//! - `load` never surfaces errors: absent, unreadable, malformed, invalid or
//!   version-mismatched values all yield `None`.
//! - `save` failures are logged and dropped; callers keep in-memory state.

use super::StoreState;
use crate::storage::KeyValueStorage;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::rc::Rc;

/// Envelope version written when none is configured.
pub const DEFAULT_PERSIST_VERSION: u32 = 0;

/// Durable mirror of one store's snapshot.
pub trait SnapshotPersistence<S> {
    /// Returns the stored snapshot, or `None` when nothing usable is stored.
    fn load(&self) -> Option<S>;
    /// Overwrites the stored snapshot.
    fn save(&self, state: &S);
    /// Removes the stored snapshot.
    fn clear(&self);
}

/// Storage key and envelope version for one persisted store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOptions {
    pub key: String,
    pub version: u32,
}

impl PersistOptions {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: DEFAULT_PERSIST_VERSION,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, S> {
    state: &'a S,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope<S> {
    state: S,
    #[serde(default)]
    version: u32,
}

/// JSON persistence adapter writing through a shared [`KeyValueStorage`].
pub struct JsonPersistence<S> {
    storage: Rc<dyn KeyValueStorage>,
    options: PersistOptions,
    _state: PhantomData<fn() -> S>,
}

impl<S> JsonPersistence<S> {
    pub fn new(storage: Rc<dyn KeyValueStorage>, options: PersistOptions) -> Self {
        Self {
            storage,
            options,
            _state: PhantomData,
        }
    }

    pub fn options(&self) -> &PersistOptions {
        &self.options
    }
}

impl<S> SnapshotPersistence<S> for JsonPersistence<S>
where
    S: StoreState + Serialize + DeserializeOwned,
{
    fn load(&self) -> Option<S> {
        let key = self.options.key.as_str();
        let raw = match self.storage.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("event=persist_load module=persist status=empty key={key}");
                return None;
            }
            Err(err) => {
                warn!(
                    "event=persist_load module=persist status=fallback key={key} error_code=read_failed error={err}"
                );
                return None;
            }
        };

        let envelope: Envelope<S> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(
                    "event=persist_load module=persist status=fallback key={key} error_code=malformed error={err}"
                );
                return None;
            }
        };

        if envelope.version != self.options.version {
            warn!(
                "event=persist_load module=persist status=fallback key={key} error_code=version_mismatch stored_version={} expected_version={}",
                envelope.version, self.options.version
            );
            return None;
        }

        if let Err(err) = envelope.state.validate() {
            warn!(
                "event=persist_load module=persist status=fallback key={key} error_code=invalid_state error={err}"
            );
            return None;
        }

        Some(envelope.state)
    }

    fn save(&self, state: &S) {
        let key = self.options.key.as_str();
        let envelope = EnvelopeRef {
            state,
            version: self.options.version,
        };
        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    "event=persist_save module=persist status=dropped key={key} error_code=serialize_failed error={err}"
                );
                return;
            }
        };

        if let Err(err) = self.storage.write(key, &raw) {
            warn!(
                "event=persist_save module=persist status=dropped key={key} error_code=write_failed error={err}"
            );
        }
    }

    fn clear(&self) {
        let key = self.options.key.as_str();
        if let Err(err) = self.storage.remove(key) {
            warn!(
                "event=persist_clear module=persist status=error key={key} error_code=remove_failed error={err}"
            );
        }
    }
}
