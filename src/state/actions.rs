//! # Per-subscriber state actions.
//!
//! [`MicroAppStateActions`] is the handle a host or an app uses to read and write the
//! global state under one subscriber id: register or drop its single listener, and
//! submit partial updates.

use std::fmt;
use std::sync::Arc;

use crate::state::{GlobalState, StateMap};

/// State actions bound to one subscriber id.
///
/// Master actions come from [`GlobalState::init`]; every loaded instance gets consumer
/// actions keyed by its instance id. Clones share the id.
#[derive(Clone)]
pub struct MicroAppStateActions {
    id: Arc<str>,
    is_master: bool,
    store: Arc<GlobalState>,
}

impl MicroAppStateActions {
    pub(crate) fn new(id: Arc<str>, is_master: bool, store: Arc<GlobalState>) -> Self {
        Self {
            id,
            is_master,
            store,
        }
    }

    /// Subscriber id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    /// Registers the listener for this id, replacing any previous one.
    ///
    /// With `fire_immediately` the listener runs once, synchronously, with the current
    /// snapshot as both arguments.
    pub fn on_global_state_change<F>(&self, callback: F, fire_immediately: bool)
    where
        F: Fn(&StateMap, &StateMap) + Send + Sync + 'static,
    {
        self.store
            .subscribe(&self.id, Arc::new(callback), fire_immediately);
    }

    /// Applies `partial` and notifies listeners. Returns `false` when nothing changed.
    pub fn set_global_state(&self, partial: StateMap) -> bool {
        self.store.set(&self.id, self.is_master, partial)
    }

    /// Removes this id's listener. Returns whether one was registered.
    pub fn off_global_state_change(&self) -> bool {
        self.store.unsubscribe(&self.id)
    }
}

impl fmt::Debug for MicroAppStateActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicroAppStateActions")
            .field("id", &self.id)
            .field("is_master", &self.is_master)
            .finish()
    }
}
