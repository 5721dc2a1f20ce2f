//! Generic observable state container.
//!
//! # Responsibility
//! - Hold one immutable snapshot per store and replace it wholesale on
//!   every mutation.
//! - Notify observers synchronously, in registration order.
//! - Write the new snapshot through to an optional persistence adapter.
//!
//! # Invariants
//! - Published snapshots are never mutated; readers may keep old ones.
//! - Notification happens before the persistence write-through.
//! - Commits are published one at a time in commit order, including commits
//!   issued by observers; the last persisted snapshot is the current one.
//! - Store operations never fail; persistence problems are logged and dropped.

use log::{debug, info};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::{Rc, Weak};

mod persist;

pub use persist::{JsonPersistence, PersistOptions, SnapshotPersistence, DEFAULT_PERSIST_VERSION};

/// Shared immutable view of a store state at one instant.
pub type Snapshot<S> = Rc<S>;

type Observer<S> = Rc<dyn Fn(&Snapshot<S>)>;

/// State record managed by a [`Store`].
///
/// `Patch` is the partial form accepted by [`Store::set_state`]; `merge`
/// performs the shallow, top-level merge into a new record.
pub trait StoreState: Clone + 'static {
    type Patch;

    fn merge(&self, patch: Self::Patch) -> Self;

    /// Checks invariants a rehydrated record must satisfy.
    fn validate(&self) -> Result<(), SnapshotError> {
        Ok(())
    }
}

/// A state record that violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotError {
    message: String,
}

impl SnapshotError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid snapshot: {}", self.message)
    }
}

impl Error for SnapshotError {}

/// Observable state container with optional persistence.
///
/// Cloning yields another handle to the same store.
pub struct Store<S: StoreState> {
    inner: Rc<StoreInner<S>>,
}

impl<S: StoreState> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct StoreInner<S: StoreState> {
    name: &'static str,
    initial: Snapshot<S>,
    snapshot: RefCell<Snapshot<S>>,
    observers: RefCell<Vec<(u64, Observer<S>)>>,
    next_observer_id: Cell<u64>,
    persistence: Option<Box<dyn SnapshotPersistence<S>>>,
    hydrated: Cell<bool>,
    pending: RefCell<VecDeque<PendingCommit<S>>>,
    publishing: Cell<bool>,
}

struct PendingCommit<S> {
    snapshot: Snapshot<S>,
    write_through: bool,
}

struct PublishingGuard<'a>(&'a Cell<bool>);

impl Drop for PublishingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<S: StoreState> Store<S> {
    /// Creates a volatile store: nothing is read from or written to storage.
    pub fn new(name: &'static str, initial: S) -> Self {
        let store = Self::build(name, initial, None);
        store.inner.hydrated.set(true);
        store
    }

    /// Creates a store that rehydrates from `persistence` and writes every
    /// new snapshot back to it.
    ///
    /// Falls back to `initial` when nothing usable is stored.
    pub fn with_persistence(
        name: &'static str,
        initial: S,
        persistence: Box<dyn SnapshotPersistence<S>>,
    ) -> Self {
        let store = Self::build(name, initial, Some(persistence));
        if let Some(restored) = store.load_persisted() {
            *store.inner.snapshot.borrow_mut() = Rc::new(restored);
        }
        store.inner.hydrated.set(true);
        store
    }

    fn build(
        name: &'static str,
        initial: S,
        persistence: Option<Box<dyn SnapshotPersistence<S>>>,
    ) -> Self {
        let initial = Rc::new(initial);
        Self {
            inner: Rc::new(StoreInner {
                name,
                snapshot: RefCell::new(initial.clone()),
                initial,
                observers: RefCell::new(Vec::new()),
                next_observer_id: Cell::new(0),
                persistence,
                hydrated: Cell::new(false),
                pending: RefCell::new(VecDeque::new()),
                publishing: Cell::new(false),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Returns the current snapshot.
    pub fn get_state(&self) -> Snapshot<S> {
        self.inner.snapshot.borrow().clone()
    }

    /// Returns the snapshot the store was constructed with, before hydration.
    pub fn get_initial_state(&self) -> Snapshot<S> {
        self.inner.initial.clone()
    }

    /// Merges `patch` into the current snapshot and publishes the result.
    pub fn set_state(&self, patch: S::Patch) {
        let next = self.get_state().merge(patch);
        self.commit(next, true);
    }

    /// Computes a patch from the current snapshot and publishes the merge.
    pub fn update(&self, mutator: impl FnOnce(&S) -> S::Patch) {
        let current = self.get_state();
        let next = current.merge(mutator(current.as_ref()));
        self.commit(next, true);
    }

    /// Publishes `state` as the full new snapshot, without merging.
    pub fn replace_state(&self, state: S) {
        self.commit(state, true);
    }

    /// Registers `observer`; it receives every snapshot published afterwards.
    pub fn subscribe(&self, observer: impl Fn(&Snapshot<S>) + 'static) -> Subscription {
        let id = self.inner.next_observer_id.get();
        self.inner.next_observer_id.set(id + 1);
        let observer: Observer<S> = Rc::new(observer);
        self.inner.observers.borrow_mut().push((id, observer));

        let store: Weak<StoreInner<S>> = Rc::downgrade(&self.inner);
        Subscription::from_fn(move || {
            if let Some(store) = store.upgrade() {
                store
                    .observers
                    .borrow_mut()
                    .retain(|(observer_id, _)| *observer_id != id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    pub fn is_persisted(&self) -> bool {
        self.inner.persistence.is_some()
    }

    /// Whether the construction-time hydration attempt has completed.
    pub fn has_hydrated(&self) -> bool {
        self.inner.hydrated.get()
    }

    /// Re-reads persisted state and publishes it when usable.
    ///
    /// Returns `true` when a stored snapshot replaced the current one. The
    /// restored snapshot is not written back.
    pub fn rehydrate(&self) -> bool {
        self.inner.hydrated.set(false);
        let restored = self.load_persisted();
        self.inner.hydrated.set(true);
        match restored {
            Some(state) => {
                self.commit(state, false);
                true
            }
            None => false,
        }
    }

    /// Removes the persisted copy; the in-memory snapshot is untouched.
    pub fn clear_storage(&self) {
        if let Some(persistence) = &self.inner.persistence {
            persistence.clear();
        }
    }

    fn load_persisted(&self) -> Option<S> {
        let persistence = self.inner.persistence.as_ref()?;
        let restored = persistence.load()?;
        info!(
            "event=store_hydrate module=store status=ok store={}",
            self.inner.name
        );
        Some(restored)
    }

    fn commit(&self, next: S, write_through: bool) {
        let next = Rc::new(next);
        *self.inner.snapshot.borrow_mut() = next.clone();
        self.inner
            .pending
            .borrow_mut()
            .push_back(PendingCommit {
                snapshot: next,
                write_through,
            });

        // A commit issued from inside an observer is queued; the outermost
        // commit drains the queue so rounds never interleave.
        if self.inner.publishing.replace(true) {
            return;
        }
        let _publishing = PublishingGuard(&self.inner.publishing);

        loop {
            let Some(commit) = self.inner.pending.borrow_mut().pop_front() else {
                break;
            };
            self.publish(commit);
        }
    }

    fn publish(&self, commit: PendingCommit<S>) {
        self.notify(&commit.snapshot);

        let persisted = commit.write_through && self.inner.persistence.is_some();
        if commit.write_through {
            if let Some(persistence) = &self.inner.persistence {
                persistence.save(&commit.snapshot);
            }
        }
        debug!(
            "event=store_commit module=store status=ok store={} persisted={persisted}",
            self.inner.name
        );
    }

    fn notify(&self, snapshot: &Snapshot<S>) {
        // Observers may subscribe, unsubscribe or mutate re-entrantly, so the
        // list is released before any of them runs.
        let observers: Vec<Observer<S>> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(snapshot);
        }
    }
}

impl<S: StoreState + std::fmt::Debug> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("state", &*self.get_state())
            .field("observers", &self.subscriber_count())
            .field("persisted", &self.is_persisted())
            .finish()
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle leaves the observer registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[must_use = "keep the handle to be able to unsubscribe later"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(f)),
        }
    }

    /// Removes the observer. Does nothing if the store is already gone.
    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SnapshotError, Store, StoreState};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    struct Pair {
        left: i32,
        right: i32,
    }

    #[derive(Default)]
    struct PairPatch {
        left: Option<i32>,
        right: Option<i32>,
    }

    impl StoreState for Pair {
        type Patch = PairPatch;

        fn merge(&self, patch: PairPatch) -> Self {
            Self {
                left: patch.left.unwrap_or(self.left),
                right: patch.right.unwrap_or(self.right),
            }
        }

        fn validate(&self) -> Result<(), SnapshotError> {
            if self.left < 0 {
                return Err(SnapshotError::new("left must be non-negative"));
            }
            Ok(())
        }
    }

    #[test]
    fn set_state_merges_shallowly() {
        let store = Store::new("pair", Pair { left: 1, right: 2 });
        store.set_state(PairPatch {
            left: Some(10),
            ..PairPatch::default()
        });
        assert_eq!(*store.get_state(), Pair { left: 10, right: 2 });
    }

    #[test]
    fn set_state_with_same_patch_twice_yields_same_state() {
        let store = Store::new("pair", Pair::default());
        store.set_state(PairPatch {
            right: Some(7),
            ..PairPatch::default()
        });
        let first = store.get_state();
        store.set_state(PairPatch {
            right: Some(7),
            ..PairPatch::default()
        });
        assert_eq!(*store.get_state(), *first);
    }

    #[test]
    fn old_snapshots_stay_unchanged_after_mutation() {
        let store = Store::new("pair", Pair::default());
        let before = store.get_state();
        store.update(|state| PairPatch {
            left: Some(state.left + 5),
            ..PairPatch::default()
        });
        assert_eq!(before.left, 0);
        assert_eq!(store.get_state().left, 5);
    }

    #[test]
    fn observers_run_in_registration_order_with_new_snapshot() {
        let store = Store::new("pair", Pair::default());
        let calls = Rc::new(RefCell::new(Vec::new()));

        let first = calls.clone();
        let _a = store.subscribe(move |state| first.borrow_mut().push(("a", state.left)));
        let second = calls.clone();
        let _b = store.subscribe(move |state| second.borrow_mut().push(("b", state.left)));

        store.set_state(PairPatch {
            left: Some(3),
            ..PairPatch::default()
        });
        store.set_state(PairPatch {
            left: Some(4),
            ..PairPatch::default()
        });

        assert_eq!(
            *calls.borrow(),
            vec![("a", 3), ("b", 3), ("a", 4), ("b", 4)]
        );
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = Store::new("pair", Pair::default());
        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();
        let subscription = store.subscribe(move |_| *counter.borrow_mut() += 1);

        store.replace_state(Pair { left: 1, right: 1 });
        subscription.unsubscribe();
        store.replace_state(Pair { left: 2, right: 2 });

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn dropping_subscription_keeps_observer() {
        let store = Store::new("pair", Pair::default());
        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();
        drop(store.subscribe(move |_| *counter.borrow_mut() += 1));

        store.replace_state(Pair { left: 1, right: 0 });
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn observer_may_mutate_store_reentrantly() {
        let store = Store::new("pair", Pair::default());
        let handle = store.clone();
        let _sub = store.subscribe(move |state| {
            if state.left == 1 {
                handle.set_state(PairPatch {
                    right: Some(99),
                    ..PairPatch::default()
                });
            }
        });

        store.set_state(PairPatch {
            left: Some(1),
            ..PairPatch::default()
        });
        assert_eq!(*store.get_state(), Pair { left: 1, right: 99 });
    }

    #[test]
    fn reentrant_commit_is_published_after_current_round() {
        let store = Store::new("pair", Pair::default());
        let handle = store.clone();
        let _mutator = store.subscribe(move |state| {
            if state.left == 1 && state.right == 0 {
                handle.set_state(PairPatch {
                    right: Some(2),
                    ..PairPatch::default()
                });
            }
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _recorder = store.subscribe(move |state| sink.borrow_mut().push(state.right));

        store.set_state(PairPatch {
            left: Some(1),
            ..PairPatch::default()
        });

        assert_eq!(*seen.borrow(), vec![0, 2]);
        assert_eq!(*store.get_state(), Pair { left: 1, right: 2 });
    }

    #[test]
    fn volatile_store_reports_hydrated_and_keeps_initial_state() {
        let store = Store::new("pair", Pair { left: 4, right: 4 });
        store.replace_state(Pair::default());

        assert!(store.has_hydrated());
        assert!(!store.is_persisted());
        assert!(!store.rehydrate());
        assert_eq!(*store.get_initial_state(), Pair { left: 4, right: 4 });
    }
}
