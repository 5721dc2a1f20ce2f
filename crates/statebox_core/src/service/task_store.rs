//! Persisted task list store.

use crate::model::task::{Task, TaskId, TaskPatch, TaskState};
use crate::storage::KeyValueStorage;
use crate::store::{JsonPersistence, PersistOptions, Snapshot, Store, Subscription};
use std::rc::Rc;

/// Store name used in log events.
pub const TASK_STORE_NAME: &str = "tasks";

/// Task list with add/toggle/delete/clear-completed mutators.
#[derive(Clone)]
pub struct TaskStore {
    store: Store<TaskState>,
}

impl TaskStore {
    /// Creates the store, rehydrating from `storage` under `options.key`.
    pub fn new(storage: Rc<dyn KeyValueStorage>, options: PersistOptions) -> Self {
        let persistence = JsonPersistence::new(storage, options);
        Self {
            store: Store::with_persistence(
                TASK_STORE_NAME,
                TaskState::default(),
                Box::new(persistence),
            ),
        }
    }

    /// Generic store handle for hydration controls and raw updates.
    pub fn store(&self) -> &Store<TaskState> {
        &self.store
    }

    pub fn get_state(&self) -> Snapshot<TaskState> {
        self.store.get_state()
    }

    pub fn subscribe(&self, observer: impl Fn(&Snapshot<TaskState>) + 'static) -> Subscription {
        self.store.subscribe(observer)
    }

    /// Appends a new incomplete task and returns its id.
    ///
    /// The title is stored as given; rejecting blank input is the caller's job.
    pub fn add_task(&self, title: impl Into<String>) -> TaskId {
        let task = Task::new(title);
        let id = task.id.clone();
        self.store.update(move |state| {
            let mut tasks = state.tasks.clone();
            tasks.push(task);
            TaskPatch::tasks(tasks)
        });
        id
    }

    /// Flips `completed` on the task with `id`.
    pub fn toggle_task(&self, id: &str) {
        self.store.update(|state| {
            TaskPatch::tasks(
                state
                    .tasks
                    .iter()
                    .map(|task| if task.id == id { task.toggled() } else { task.clone() })
                    .collect(),
            )
        });
    }

    /// Removes the task with `id`.
    pub fn delete_task(&self, id: &str) {
        self.store.update(|state| {
            TaskPatch::tasks(
                state
                    .tasks
                    .iter()
                    .filter(|task| task.id != id)
                    .cloned()
                    .collect(),
            )
        });
    }

    /// Removes every completed task, keeping the rest in order.
    pub fn clear_completed(&self) {
        self.store.update(|state| {
            TaskPatch::tasks(
                state
                    .tasks
                    .iter()
                    .filter(|task| !task.completed)
                    .cloned()
                    .collect(),
            )
        });
    }
}
