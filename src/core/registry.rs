//! # App registry.
//!
//! Holds route-driven apps in registration order. Names are the identity key:
//! a descriptor whose name is already present (or repeated within one batch) is
//! skipped and reported with `DuplicateRegistration`.
//!
//! ```text
//! register([a, b, a, c]) with {b} present
//!   ├─ a → AppRegistered
//!   ├─ b → DuplicateRegistration
//!   ├─ a → DuplicateRegistration
//!   └─ c → AppRegistered          returns [a, c]
//! ```

use parking_lot::RwLock;

use crate::apps::RegistrableApp;
use crate::events::{Bus, Event, EventKind};

pub(crate) struct AppRegistry {
    apps: RwLock<Vec<RegistrableApp>>,
    bus: Bus,
}

impl AppRegistry {
    pub(crate) fn new(bus: Bus) -> Self {
        Self {
            apps: RwLock::new(Vec::new()),
            bus,
        }
    }

    /// Appends apps with unseen names. Returns the accepted ones, in order.
    pub(crate) fn register(&self, batch: Vec<RegistrableApp>) -> Vec<RegistrableApp> {
        let mut apps = self.apps.write();
        let mut accepted = Vec::new();
        for app in batch {
            if apps.iter().any(|a| a.name() == app.name()) {
                self.bus
                    .publish(Event::new(EventKind::DuplicateRegistration).with_app(app.name()));
                continue;
            }
            self.bus
                .publish(Event::new(EventKind::AppRegistered).with_app(app.name()));
            apps.push(app.clone());
            accepted.push(app);
        }
        accepted
    }

    /// Registered apps, in registration order.
    pub(crate) fn list(&self) -> Vec<RegistrableApp> {
        self.apps.read().clone()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.apps.read().iter().map(|a| a.name().to_string()).collect()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, name: &str) -> Option<RegistrableApp> {
        self.apps.read().iter().find(|a| a.name() == name).cloned()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.apps.read().len()
    }

    pub(crate) fn reset(&self) {
        self.apps.write().clear();
    }
}
