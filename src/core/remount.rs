//! # Remount cache for manual loads.
//!
//! Manual loads are keyed by app name, or by name plus the container's structural
//! path. The pending load is stored *before* it is awaited, so concurrent calls with
//! the same key converge on one fetch and one script evaluation.
//!
//! ```text
//! load_micro_app(react, #c1) ──► key "react-/html[1]/body[1]/div[1]"
//!        miss ─► insert Shared(load_app(..)) ─► await
//!        hit  ─► clone Shared               ─► await ─► wrap_for_remount
//! ```
//!
//! Entries are never evicted; a failed load stays cached. A cache hit never bootstraps
//! again but waits for the first handle's bootstrap to settle. [`RemountCache::clear`]
//! exists for resets.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::apps::lifecycle_fn;
use crate::core::deferred::Deferred;
use crate::core::orchestrator::{ConfigGetter, ParcelConfig};
use crate::core::parcel::{AppStatus, MicroApp};
use crate::error::FrameworkError;

/// Pending result of one orchestrator load.
pub(crate) type GetterFuture = Shared<BoxFuture<'static, Result<ConfigGetter, FrameworkError>>>;

/// Outcome of the one real bootstrap of a cached instance.
pub(crate) type BootstrapGate = Arc<Deferred<Result<(), FrameworkError>>>;

/// Cache key: `name` alone, or `name-<xpath>` when the container resolved.
pub(crate) fn cache_key(name: &str, xpath: Option<&str>, by_name: bool) -> String {
    match xpath {
        Some(path) if !by_name => format!("{name}-{path}"),
        _ => name.to_string(),
    }
}

/// One cached instance: its pending load and its bootstrap outcome.
#[derive(Clone)]
pub(crate) struct CacheEntry {
    pub(crate) getter: GetterFuture,
    pub(crate) bootstrapped: BootstrapGate,
}

#[derive(Default)]
pub(crate) struct RemountCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl RemountCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for `key`, or inserts one around the load built by
    /// `make`. The flag is `true` on a hit.
    pub(crate) fn get_or_insert_with<F>(&self, key: &str, make: F) -> (CacheEntry, bool)
    where
        F: FnOnce() -> GetterFuture,
    {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(key) {
            return (entry.clone(), true);
        }
        let entry = CacheEntry {
            getter: make(),
            bootstrapped: Arc::new(Deferred::new()),
        };
        entries.insert(key.to_string(), entry.clone());
        (entry, false)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Manual loads per container path, in load order. A parcel leaves its list once
/// it has unmounted or broken.
#[derive(Default)]
pub(crate) struct ContainerApps {
    apps: Mutex<HashMap<String, Vec<Arc<MicroApp>>>>,
}

impl ContainerApps {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, xpath: &str, app: Arc<MicroApp>) {
        self.apps.lock().entry(xpath.to_string()).or_default().push(app);
    }

    /// Apps listed ahead of the parcel `id`; every listed app once `id` has left.
    pub(crate) fn before(&self, xpath: &str, id: u64) -> Vec<Arc<MicroApp>> {
        self.apps
            .lock()
            .get(xpath)
            .map(|apps| apps.iter().take_while(|a| a.id() != id).cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn remove(&self, xpath: &str, id: u64) {
        let mut apps = self.apps.lock();
        if let Some(list) = apps.get_mut(xpath) {
            list.retain(|a| a.id() != id);
            if list.is_empty() {
                apps.remove(xpath);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn total(&self) -> usize {
        self.apps.lock().values().map(Vec::len).sum()
    }

    pub(crate) fn clear(&self) {
        self.apps.lock().clear();
    }
}

/// Waits until `app` no longer occupies its container: its mount settled and, if
/// it succeeded, its unmount settled too.
pub(crate) async fn vacated(app: &MicroApp) {
    if app.mount_promise().await.is_ok() {
        let _ = app.unmount_promise().await;
    }
}

/// Adapts a parcel config for a manual load.
///
/// - first handle of an instance: the real `bootstrap` runs and its outcome is
///   published on the gate
/// - cached instance: `bootstrap` only waits for that outcome
/// - with a container: mounting first waits for every earlier, non-broken app in
///   the same container to vacate it
pub(crate) fn wrap_for_remount<F>(
    mut cfg: ParcelConfig,
    cached: bool,
    gate: BootstrapGate,
    predecessors: Option<F>,
) -> ParcelConfig
where
    F: Fn() -> Vec<Arc<MicroApp>> + Send + Sync + 'static,
{
    if cached {
        cfg.bootstrap = lifecycle_fn(move |_| {
            let gate = Arc::clone(&gate);
            async move { gate.wait().await }
        });
    } else {
        let bootstrap = cfg.bootstrap.clone();
        cfg.bootstrap = lifecycle_fn(move |props| {
            let bootstrap = bootstrap.clone();
            let gate = Arc::clone(&gate);
            async move {
                let outcome = bootstrap(props).await;
                gate.resolve(outcome.clone());
                outcome
            }
        });
    }
    if let Some(predecessors) = predecessors {
        let predecessors = Arc::new(predecessors);
        let wait = lifecycle_fn(move |_| {
            let earlier = predecessors();
            async move {
                for app in earlier.iter().filter(|a| a.status() != AppStatus::Broken) {
                    vacated(app).await;
                }
                Ok(())
            }
        });
        cfg.mount.insert(0, wait);
    }
    cfg
}
