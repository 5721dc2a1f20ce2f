//! Volatile counter store.
//!
//! Deliberately built without persistence: every new instance starts at zero.

use crate::model::counter::{CounterPatch, CounterState};
use crate::store::{Snapshot, Store, Subscription};

pub const COUNTER_STORE_NAME: &str = "counter";

#[derive(Clone)]
pub struct CounterStore {
    store: Store<CounterState>,
}

impl Default for CounterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterStore {
    pub fn new() -> Self {
        Self {
            store: Store::new(COUNTER_STORE_NAME, CounterState::default()),
        }
    }

    pub fn store(&self) -> &Store<CounterState> {
        &self.store
    }

    pub fn get_state(&self) -> Snapshot<CounterState> {
        self.store.get_state()
    }

    pub fn subscribe(&self, observer: impl Fn(&Snapshot<CounterState>) + 'static) -> Subscription {
        self.store.subscribe(observer)
    }

    // Saturates at the i64 bounds instead of overflowing.
    pub fn increment(&self) {
        self.store.update(|state| CounterPatch {
            count: Some(state.count.saturating_add(1)),
        });
    }

    pub fn decrement(&self) {
        self.store.update(|state| CounterPatch {
            count: Some(state.count.saturating_sub(1)),
        });
    }

    pub fn reset(&self) {
        self.store.set_state(CounterPatch { count: Some(0) });
    }
}
