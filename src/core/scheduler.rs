//! # Route-activation substrate.
//!
//! A [`Scheduler`] owns registered apps and mounts/unmounts their parcels as the
//! location changes. It does no URL matching of its own: each app carries an
//! [`ActiveWhen`] predicate.
//!
//! [`ActivityScheduler`] is the shipped implementation:
//! ```text
//! reroute(location)
//!   ├─ not started → remember location only
//!   └─ started     → unmount mounted apps that became inactive
//!                    then mount inactive apps that became active (registration order)
//! ```
//! Reroutes are serialized. Broken parcels are skipped. The first failure is
//! returned after every app was visited.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::apps::ActiveWhen;
use crate::core::parcel::{AppStatus, MicroApp};
use crate::error::FrameworkError;

/// An app handed to the scheduler.
#[derive(Clone)]
pub struct ScheduledApp {
    pub name: String,
    pub active_when: ActiveWhen,
    pub parcel: Arc<MicroApp>,
}

impl fmt::Debug for ScheduledApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledApp")
            .field("name", &self.name)
            .field("parcel", &self.parcel)
            .finish()
    }
}

/// Route-activation substrate.
#[async_trait]
pub trait Scheduler: Send + Sync + 'static {
    /// Adds an app. Duplicates are filtered before this is called.
    fn register(&self, app: ScheduledApp);

    /// Begins driving parcels; applies the last known location.
    async fn start(&self) -> Result<(), FrameworkError>;

    /// Applies a new location.
    async fn reroute(&self, location: &str) -> Result<(), FrameworkError>;

    /// Registered app names, in registration order.
    fn app_names(&self) -> Vec<String>;

    /// Drops every registered app and returns to the not-started state.
    fn reset(&self);
}

/// Predicate-driven [`Scheduler`].
#[derive(Default)]
pub struct ActivityScheduler {
    apps: Mutex<Vec<ScheduledApp>>,
    location: Mutex<String>,
    started: AtomicBool,
    turn: AsyncMutex<()>,
}

impl ActivityScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler positioned at `location`.
    pub fn at(location: impl Into<String>) -> Self {
        let s = Self::default();
        *s.location.lock() = location.into();
        s
    }

    pub fn location(&self) -> String {
        self.location.lock().clone()
    }

    async fn apply(&self) -> Result<(), FrameworkError> {
        let _turn = self.turn.lock().await;
        let location = self.location();
        let apps = self.apps.lock().clone();
        let mut first_err = None;

        for app in apps.iter().filter(|a| !(a.active_when)(&location)) {
            if app.parcel.status() == AppStatus::Mounted {
                if let Err(e) = app.parcel.unmount().await {
                    first_err.get_or_insert(e);
                }
            }
        }
        for app in apps.iter().filter(|a| (a.active_when)(&location)) {
            let status = app.parcel.status();
            if status.is_active() || status == AppStatus::Broken {
                continue;
            }
            if let Err(e) = app.parcel.mount().await {
                first_err.get_or_insert(e);
            }
        }

        first_err.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl Scheduler for ActivityScheduler {
    fn register(&self, app: ScheduledApp) {
        self.apps.lock().push(app);
    }

    async fn start(&self) -> Result<(), FrameworkError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.apply().await
    }

    async fn reroute(&self, location: &str) -> Result<(), FrameworkError> {
        *self.location.lock() = location.to_string();
        if !self.started.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.apply().await
    }

    fn app_names(&self) -> Vec<String> {
        self.apps.lock().iter().map(|a| a.name.clone()).collect()
    }

    fn reset(&self) {
        self.apps.lock().clear();
        self.started.store(false, Ordering::SeqCst);
    }
}
