//! Concrete stores and the application-level store context.
//!
//! # Responsibility
//! - Instantiate the generic store for tasks, preferences and the counter.
//! - Expose each store's named mutators as typed methods.
//! - Own all three stores in one context built at startup.
//!
//! # Invariants
//! - Task and preference stores are persisted; the counter never is.
//! - Mutators are total: unknown ids are identity no-ops, never errors.

pub mod app_stores;
pub mod counter_store;
pub mod task_store;
pub mod user_store;
