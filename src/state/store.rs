//! # Global state store.
//!
//! [`GlobalState`] owns the live map and the listener table. It is created once per
//! [`Framework`](crate::Framework) and shared (`Arc`) with every instance's actions.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::events::{Bus, Event, EventKind};
use crate::state::MicroAppStateActions;

/// Top-level state map.
pub type StateMap = Map<String, Value>;

/// Listener invoked with `(new_state, prev_state)`.
pub type StateCallback = Arc<dyn Fn(&StateMap, &StateMap) + Send + Sync>;

#[derive(Default)]
struct Inner {
    state: StateMap,
    listeners: IndexMap<String, StateCallback>,
}

/// Process-scoped state store with per-id listeners.
pub struct GlobalState {
    inner: Mutex<Inner>,
    bus: Bus,
}

impl GlobalState {
    /// Creates an empty store publishing diagnostics on `bus`.
    pub fn new(bus: Bus) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            bus,
        }
    }

    /// Seeds the store and returns master actions.
    ///
    /// Re-seeding with a map equal to the live store is a no-op reported as
    /// [`EventKind::StateUnchanged`]; otherwise every listener is notified.
    pub fn init(self: &Arc<Self>, initial: StateMap) -> MicroAppStateActions {
        let id = format!("global-{}", unix_ms());
        let swapped = {
            let mut inner = self.inner.lock();
            if inner.state == initial {
                None
            } else {
                let prev = std::mem::replace(&mut inner.state, initial);
                Some(self.prepare_emit(&inner, prev))
            }
        };
        match swapped {
            Some(pass) => {
                self.bus.publish(
                    Event::new(EventKind::StateChanged)
                        .with_instance(id.as_str())
                        .with_reason("init"),
                );
                pass.run();
            }
            None => self
                .bus
                .publish(Event::new(EventKind::StateUnchanged).with_instance(id.as_str())),
        }
        self.actions(id, true)
    }

    /// Returns actions bound to `id`.
    pub fn actions(self: &Arc<Self>, id: impl Into<Arc<str>>, is_master: bool) -> MicroAppStateActions {
        MicroAppStateActions::new(id.into(), is_master, Arc::clone(self))
    }

    /// Deep copy of the live store.
    pub fn snapshot(&self) -> StateMap {
        self.inner.lock().state.clone()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// True when `id` has a registered listener.
    pub fn has_listener(&self, id: &str) -> bool {
        self.inner.lock().listeners.contains_key(id)
    }

    /// Clears the store and every listener.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state.clear();
        inner.listeners.clear();
    }

    pub(crate) fn subscribe(&self, id: &str, callback: StateCallback, fire_immediately: bool) {
        let current = {
            let mut inner = self.inner.lock();
            if inner
                .listeners
                .insert(id.to_string(), Arc::clone(&callback))
                .is_some()
            {
                self.bus
                    .publish(Event::new(EventKind::StateListenerOverwritten).with_instance(id));
            }
            fire_immediately.then(|| inner.state.clone())
        };
        if let Some(snapshot) = current {
            callback(&snapshot, &snapshot);
        }
    }

    pub(crate) fn unsubscribe(&self, id: &str) -> bool {
        self.inner.lock().listeners.shift_remove(id).is_some()
    }

    pub(crate) fn set(&self, id: &str, is_master: bool, partial: StateMap) -> bool {
        let pass = {
            let mut inner = self.inner.lock();
            if partial.is_empty() || inner.state == partial {
                self.bus
                    .publish(Event::new(EventKind::StateUnchanged).with_instance(id));
                return false;
            }

            let prev = inner.state.clone();
            let mut changed = Vec::new();
            for (key, value) in partial {
                if is_master || inner.state.contains_key(&key) {
                    inner.state.insert(key.clone(), value);
                    changed.push(key);
                } else {
                    self.bus.publish(
                        Event::new(EventKind::StateKeyRejected)
                            .with_instance(id)
                            .with_key(key.as_str()),
                    );
                }
            }
            if changed.is_empty() {
                self.bus
                    .publish(Event::new(EventKind::StateUnchanged).with_instance(id));
                return false;
            }
            self.bus.publish(
                Event::new(EventKind::StateChanged)
                    .with_instance(id)
                    .with_reason(changed.join(",")),
            );
            self.prepare_emit(&inner, prev)
        };
        pass.run();
        true
    }

    fn prepare_emit(&self, inner: &Inner, prev: StateMap) -> NotifyPass {
        NotifyPass {
            next: inner.state.clone(),
            prev,
            listeners: inner.listeners.values().cloned().collect(),
        }
    }
}

/// Listeners and snapshots captured under the lock, run after it is released.
struct NotifyPass {
    next: StateMap,
    prev: StateMap,
    listeners: Vec<StateCallback>,
}

impl NotifyPass {
    fn run(self) {
        for listener in &self.listeners {
            listener(&self.next, &self.prev);
        }
    }
}

pub(crate) fn unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(v: Value) -> StateMap {
        match v {
            Value::Object(m) => m,
            other => panic!("not an object: {other}"),
        }
    }

    fn store() -> Arc<GlobalState> {
        Arc::new(GlobalState::new(Bus::new(64)))
    }

    fn recorder() -> (Arc<Mutex<Vec<(StateMap, StateMap)>>>, impl Fn(&StateMap, &StateMap) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |next: &StateMap, prev: &StateMap| {
            sink.lock().push((next.clone(), prev.clone()))
        })
    }

    #[test]
    fn empty_or_unchanged_partial_is_rejected() {
        let store = store();
        let master = store.init(map(json!({ "a": 1 })));
        let (seen, cb) = recorder();
        master.on_global_state_change(cb, false);

        assert!(!master.set_global_state(StateMap::new()));
        assert!(!master.set_global_state(store.snapshot()));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn non_master_cannot_introduce_keys() {
        let store = store();
        store.init(map(json!({ "a": 1 })));
        let consumer = store.actions("vue_1", false);
        let (seen, cb) = recorder();
        consumer.on_global_state_change(cb, false);

        assert!(!consumer.set_global_state(map(json!({ "b": 2 }))));
        assert_eq!(store.snapshot(), map(json!({ "a": 1 })));
        assert!(seen.lock().is_empty());

        assert!(consumer.set_global_state(map(json!({ "a": 3, "c": 4 }))));
        assert_eq!(store.snapshot(), map(json!({ "a": 3 })));
    }

    #[test]
    fn master_introduces_keys() {
        let store = store();
        let master = store.init(map(json!({ "a": 1 })));
        let consumer = store.actions("vue_1", false);

        assert!(master.set_global_state(map(json!({ "user": "ann" }))));
        assert!(!consumer.set_global_state(map(json!({ "token": "x" }))));
        assert_eq!(store.snapshot(), map(json!({ "a": 1, "user": "ann" })));
    }

    #[test]
    fn second_listener_replaces_first() {
        let store = store();
        let master = store.init(map(json!({ "a": 1 })));
        let consumer = store.actions("react_1", false);
        let (first, cb1) = recorder();
        let (second, cb2) = recorder();

        consumer.on_global_state_change(cb1, false);
        consumer.on_global_state_change(cb2, false);
        assert_eq!(store.listener_count(), 1);

        assert!(master.set_global_state(map(json!({ "a": 2 }))));
        assert!(first.lock().is_empty());
        let calls = second.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, map(json!({ "a": 2 })));
        assert_eq!(calls[0].1, map(json!({ "a": 1 })));
    }

    #[test]
    fn fire_immediately_observes_latest_state() {
        let store = store();
        let master = store.init(map(json!({ "a": 1 })));
        assert!(master.set_global_state(map(json!({ "a": 2 }))));

        let fresh = store.actions("late_1", false);
        let (seen, cb) = recorder();
        fresh.on_global_state_change(cb, true);

        let calls = seen.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, map(json!({ "a": 2 })));
        assert_eq!(calls[0].1, map(json!({ "a": 2 })));
    }

    #[test]
    fn listeners_run_in_registration_order_and_may_write_back() {
        let store = store();
        let master = store.init(map(json!({ "n": 0, "echo": 0 })));
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = store.actions("first", false);
        let o = Arc::clone(&order);
        let writer = first.clone();
        first.on_global_state_change(
            move |next, _| {
                o.lock().push("first");
                if next.get("echo") == Some(&json!(0)) {
                    writer.set_global_state(map(json!({ "echo": 1 })));
                }
            },
            false,
        );
        let o = Arc::clone(&order);
        store
            .actions("second", false)
            .on_global_state_change(move |_, _| o.lock().push("second"), false);

        assert!(master.set_global_state(map(json!({ "n": 1 }))));
        assert_eq!(store.snapshot(), map(json!({ "n": 1, "echo": 1 })));
        assert_eq!(*order.lock(), vec!["first", "first", "second", "second"]);
    }

    #[test]
    fn reinit_with_equal_map_is_silent() {
        let store = store();
        store.init(map(json!({ "a": 1 })));
        let (seen, cb) = recorder();
        store.actions("x", false).on_global_state_change(cb, false);

        let master = store.init(map(json!({ "a": 1 })));
        assert!(master.is_master());
        assert!(master.id().starts_with("global-"));
        assert!(seen.lock().is_empty());

        store.init(map(json!({ "a": 5 })));
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn off_is_idempotent_and_reset_clears() {
        let store = store();
        let master = store.init(map(json!({ "a": 1 })));
        let consumer = store.actions("vue_1", false);
        consumer.on_global_state_change(|_, _| {}, false);

        assert!(consumer.off_global_state_change());
        assert!(!consumer.off_global_state_change());
        assert!(!store.has_listener("vue_1"));

        master.on_global_state_change(|_, _| {}, false);
        store.reset();
        assert!(store.snapshot().is_empty());
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn diagnostics_are_published() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let store = Arc::new(GlobalState::new(bus));
        store.init(map(json!({ "a": 1 })));
        let consumer = store.actions("vue_1", false);
        consumer.set_global_state(map(json!({ "nope": true })));

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push((ev.kind, ev.key.as_deref().map(str::to_string)));
        }
        assert_eq!(
            kinds,
            vec![
                (EventKind::StateChanged, None),
                (EventKind::StateKeyRejected, Some("nope".to_string())),
                (EventKind::StateUnchanged, None),
            ]
        );
    }
}
