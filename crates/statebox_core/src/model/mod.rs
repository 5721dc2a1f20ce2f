//! State records for the task, preference and counter stores.
//!
//! # Responsibility
//! - Define the serialized shape of each store snapshot.
//! - Define the partial patch each store merges on mutation.
//!
//! # Invariants
//! - Records are plain values; stores replace them wholesale.
//! - Persisted records deserialize field-by-field over their defaults.

pub mod counter;
pub mod preferences;
pub mod task;
