//! Task list record.
//!
//! # Invariants
//! - `Task::id` is generated once and never reused for another task.
//! - Ids are unique within `TaskState::tasks`; rehydrated lists violating
//!   this are rejected by `validate`.
//! - List order is insertion order.

use crate::store::{SnapshotError, StoreState};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Opaque task identifier.
pub type TaskId = String;

/// One entry of the task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Display text, stored as given.
    pub title: String,
    pub completed: bool,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub created_at: String,
}

impl Task {
    /// Creates an incomplete task with a fresh id and the current time.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(new_task_id(), title, now_iso8601())
    }

    /// Creates an incomplete task with caller-provided identity and timestamp.
    pub fn with_id(
        id: impl Into<TaskId>,
        title: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
            created_at: created_at.into(),
        }
    }

    /// Returns a copy with `completed` flipped.
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }
}

/// Generates a new opaque task id.
pub fn new_task_id() -> TaskId {
    Uuid::new_v4().to_string()
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Snapshot of the task store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskState {
    pub tasks: Vec<Task>,
}

impl TaskState {
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.len() - self.active_count()
    }
}

/// Partial update for [`TaskState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub tasks: Option<Vec<Task>>,
}

impl TaskPatch {
    pub fn tasks(tasks: Vec<Task>) -> Self {
        Self { tasks: Some(tasks) }
    }
}

impl StoreState for TaskState {
    type Patch = TaskPatch;

    fn merge(&self, patch: TaskPatch) -> Self {
        Self {
            tasks: patch.tasks.unwrap_or_else(|| self.tasks.clone()),
        }
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(SnapshotError::new(format!(
                    "duplicate task id `{}`",
                    task.id
                )));
            }
        }
        Ok(())
    }
}
