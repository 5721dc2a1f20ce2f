//! Persisted user preference store.

use crate::model::preferences::{PreferencesPatch, Theme, UserPreferences};
use crate::storage::KeyValueStorage;
use crate::store::{JsonPersistence, PersistOptions, Snapshot, Store, Subscription};
use std::rc::Rc;

pub const USER_STORE_NAME: &str = "user_preferences";

#[derive(Clone)]
pub struct UserStore {
    store: Store<UserPreferences>,
}

impl UserStore {
    pub fn new(storage: Rc<dyn KeyValueStorage>, options: PersistOptions) -> Self {
        let persistence = JsonPersistence::new(storage, options);
        Self {
            store: Store::with_persistence(
                USER_STORE_NAME,
                UserPreferences::default(),
                Box::new(persistence),
            ),
        }
    }

    pub fn store(&self) -> &Store<UserPreferences> {
        &self.store
    }

    pub fn get_state(&self) -> Snapshot<UserPreferences> {
        self.store.get_state()
    }

    pub fn subscribe(
        &self,
        observer: impl Fn(&Snapshot<UserPreferences>) + 'static,
    ) -> Subscription {
        self.store.subscribe(observer)
    }

    pub fn set_theme(&self, theme: Theme) {
        self.store.set_state(PreferencesPatch {
            theme: Some(theme),
            ..PreferencesPatch::default()
        });
    }

    pub fn toggle_notifications(&self) {
        self.store.update(|state| PreferencesPatch {
            notifications: Some(!state.notifications),
            ..PreferencesPatch::default()
        });
    }
}
