//! Counter record. Never persisted.

use crate::store::StoreState;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterState {
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterPatch {
    pub count: Option<i64>,
}

impl StoreState for CounterState {
    type Patch = CounterPatch;

    fn merge(&self, patch: CounterPatch) -> Self {
        Self {
            count: patch.count.unwrap_or(self.count),
        }
    }
}
