//! # Parcel handle of one loaded app.
//!
//! [`MicroApp`] drives a [`ParcelConfig`] through its states. Loading and bootstrap
//! happen lazily on the first `mount`; later mounts go straight to the mount chain.
//!
//! ```text
//! NotLoaded ─► Loading ─► NotBootstrapped ─► Bootstrapping ─► NotMounted
//!                                                               │  ▲
//!                                                        mount  ▼  │ unmount
//!                                                             Mounted ─► Updating
//! any failure ─► Broken (terminal)
//! ```
//!
//! ## Rules
//! - Transitions are serialized: a queued `unmount` runs after an in-flight `mount`.
//! - In-flight hook chains are never cancelled.
//! - Each `*_promise` completes once, with the outcome of the first matching transition.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::apps::LifecycleProps;
use crate::core::deferred::Deferred;
use crate::core::hooks::run_chain;
use crate::core::orchestrator::ParcelConfig;
use crate::error::FrameworkError;
use crate::events::{Bus, Event, EventKind};

/// Pending parcel config, shared by every handle that converged on one load.
pub type LoadFuture = Shared<BoxFuture<'static, Result<ParcelConfig, FrameworkError>>>;

static PARCEL_SEQ: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique parcel id.
pub(crate) fn next_parcel_id() -> u64 {
    PARCEL_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Parcel state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AppStatus {
    NotLoaded,
    Loading,
    NotBootstrapped,
    Bootstrapping,
    NotMounted,
    Mounting,
    Mounted,
    Updating,
    Unmounting,
    Broken,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::NotLoaded => "not_loaded",
            AppStatus::Loading => "loading",
            AppStatus::NotBootstrapped => "not_bootstrapped",
            AppStatus::Bootstrapping => "bootstrapping",
            AppStatus::NotMounted => "not_mounted",
            AppStatus::Mounting => "mounting",
            AppStatus::Mounted => "mounted",
            AppStatus::Updating => "updating",
            AppStatus::Unmounting => "unmounting",
            AppStatus::Broken => "broken",
        }
    }

    /// Mounted, or on its way in or out.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppStatus::Mounting | AppStatus::Mounted | AppStatus::Updating | AppStatus::Unmounting
        )
    }
}

type Outcome = Deferred<Result<(), FrameworkError>>;

/// Handle of one loaded (or loading) app.
pub struct MicroApp {
    id: u64,
    name: String,
    props: Mutex<Value>,
    loader: LoadFuture,
    config: Mutex<Option<ParcelConfig>>,
    status: Mutex<AppStatus>,
    queue: Arc<AsyncMutex<()>>,
    loaded: Outcome,
    bootstrapped: Outcome,
    mounted: Outcome,
    unmounted: Outcome,
    bus: Bus,
}

impl MicroApp {
    pub(crate) fn new(id: u64, name: impl Into<String>, props: Value, loader: LoadFuture, bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            id,
            name: name.into(),
            props: Mutex::new(props),
            loader,
            config: Mutex::new(None),
            status: Mutex::new(AppStatus::NotLoaded),
            queue: Arc::new(AsyncMutex::new(())),
            loaded: Deferred::new(),
            bootstrapped: Deferred::new(),
            mounted: Deferred::new(),
            unmounted: Deferred::new(),
            bus,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> AppStatus {
        *self.status.lock()
    }

    /// Instance id, once loaded.
    pub fn instance_id(&self) -> Option<Arc<str>> {
        self.config.lock().as_ref().map(|c| Arc::clone(&c.instance_id))
    }

    /// Loads and bootstraps if needed, then runs the mount chain.
    pub async fn mount(&self) -> Result<(), FrameworkError> {
        let _turn = self.queue.lock().await;
        self.mount_locked().await
    }

    /// Runs the unmount chain. Only valid while mounted.
    pub async fn unmount(&self) -> Result<(), FrameworkError> {
        let _turn = self.queue.lock().await;
        self.expect_status(AppStatus::Mounted, "unmount")?;
        let cfg = self.loaded_config()?;

        self.set_status(AppStatus::Unmounting);
        match run_chain(&cfg.unmount, &self.lifecycle_props(), "unmount").await {
            Ok(()) => {
                self.set_status(AppStatus::NotMounted);
                self.unmounted.resolve(Ok(()));
                Ok(())
            }
            Err(e) => {
                self.unmounted.resolve(Err(e.clone()));
                Err(self.broken(e))
            }
        }
    }

    /// Calls the app's `update` with new custom props. Only valid while mounted.
    pub async fn update(&self, props: Value) -> Result<(), FrameworkError> {
        let _turn = self.queue.lock().await;
        self.expect_status(AppStatus::Mounted, "update")?;
        let cfg = self.loaded_config()?;
        let Some(update) = cfg.update.clone() else {
            return Err(FrameworkError::InvalidConfig {
                app: self.name.clone(),
                reason: "app does not export an update function".into(),
            });
        };

        *self.props.lock() = props;
        self.set_status(AppStatus::Updating);
        match update(self.lifecycle_props()).await {
            Ok(()) => {
                self.set_status(AppStatus::Mounted);
                Ok(())
            }
            Err(e) => Err(self.broken(e.in_phase(&self.name, "update"))),
        }
    }

    /// Completes once loading finished.
    pub async fn load_promise(&self) -> Result<(), FrameworkError> {
        self.loaded.wait().await
    }

    /// Completes once bootstrap finished.
    pub async fn bootstrap_promise(&self) -> Result<(), FrameworkError> {
        self.bootstrapped.wait().await
    }

    /// Completes after the first mount.
    pub async fn mount_promise(&self) -> Result<(), FrameworkError> {
        self.mounted.wait().await
    }

    /// Completes after the first unmount.
    pub async fn unmount_promise(&self) -> Result<(), FrameworkError> {
        self.unmounted.wait().await
    }

    /// Mounts in the background. The transition queue is claimed before returning,
    /// so calls made afterwards run behind this mount.
    pub(crate) fn spawn_mount(self: &Arc<Self>) {
        let app = Arc::clone(self);
        match Arc::clone(&self.queue).try_lock_owned() {
            Ok(turn) => {
                tokio::spawn(async move { app.mount_queued(turn).await });
            }
            Err(_) => {
                tokio::spawn(async move {
                    let _ = app.mount().await;
                });
            }
        }
    }

    async fn mount_queued(&self, _turn: OwnedMutexGuard<()>) {
        let _ = self.mount_locked().await;
    }

    async fn mount_locked(&self) -> Result<(), FrameworkError> {
        let status = self.status();
        if !matches!(
            status,
            AppStatus::NotLoaded | AppStatus::NotBootstrapped | AppStatus::NotMounted
        ) {
            return Err(self.invalid("mount", status));
        }

        let cfg = self.ensure_loaded().await?;
        self.ensure_bootstrapped(&cfg).await?;

        self.set_status(AppStatus::Mounting);
        match run_chain(&cfg.mount, &self.lifecycle_props(), "mount").await {
            Ok(()) => {
                self.set_status(AppStatus::Mounted);
                self.mounted.resolve(Ok(()));
                Ok(())
            }
            Err(e) => {
                self.mounted.resolve(Err(e.clone()));
                Err(self.broken(e))
            }
        }
    }

    async fn ensure_loaded(&self) -> Result<ParcelConfig, FrameworkError> {
        if let Some(cfg) = self.config.lock().clone() {
            return Ok(cfg);
        }
        self.set_status(AppStatus::Loading);
        match self.loader.clone().await {
            Ok(cfg) => {
                *self.config.lock() = Some(cfg.clone());
                self.set_status(AppStatus::NotBootstrapped);
                self.loaded.resolve(Ok(()));
                Ok(cfg)
            }
            Err(e) => {
                self.loaded.resolve(Err(e.clone()));
                self.mounted.resolve(Err(e.clone()));
                Err(self.broken(e))
            }
        }
    }

    async fn ensure_bootstrapped(&self, cfg: &ParcelConfig) -> Result<(), FrameworkError> {
        if self.status() != AppStatus::NotBootstrapped {
            return Ok(());
        }
        self.set_status(AppStatus::Bootstrapping);
        match (cfg.bootstrap)(self.lifecycle_props()).await {
            Ok(()) => {
                self.set_status(AppStatus::NotMounted);
                self.bootstrapped.resolve(Ok(()));
                Ok(())
            }
            Err(e) => {
                let e = e.in_phase(&self.name, "bootstrap");
                self.bootstrapped.resolve(Err(e.clone()));
                self.mounted.resolve(Err(e.clone()));
                Err(self.broken(e))
            }
        }
    }

    fn loaded_config(&self) -> Result<ParcelConfig, FrameworkError> {
        let status = self.status();
        self.config
            .lock()
            .clone()
            .ok_or_else(|| self.invalid("run", status))
    }

    fn lifecycle_props(&self) -> LifecycleProps {
        LifecycleProps::new(self.name.as_str(), self.props.lock().clone())
    }

    fn set_status(&self, status: AppStatus) {
        *self.status.lock() = status;
    }

    fn expect_status(&self, want: AppStatus, action: &'static str) -> Result<(), FrameworkError> {
        let status = self.status();
        if status == want {
            Ok(())
        } else {
            Err(self.invalid(action, status))
        }
    }

    fn invalid(&self, action: &'static str, status: AppStatus) -> FrameworkError {
        FrameworkError::InvalidTransition {
            app: self.name.clone(),
            action,
            status: status.as_str(),
        }
    }

    /// Marks the parcel broken and reports it.
    fn broken(&self, e: FrameworkError) -> FrameworkError {
        self.set_status(AppStatus::Broken);
        let mut ev = Event::new(EventKind::AppBroken)
            .with_app(self.name.as_str())
            .with_reason(e.to_string());
        if let Some(id) = self.instance_id() {
            ev = ev.with_instance(id);
        }
        self.bus.publish(ev);
        e
    }
}

impl std::fmt::Debug for MicroApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicroApp")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use futures::FutureExt;
    use serde_json::json;

    use super::*;
    use crate::apps::{Hook, lifecycle_fn};
    use crate::testing::{self, Log};

    fn logged(log: &Log, tag: &'static str, delay: Duration) -> Hook {
        let log = Arc::clone(log);
        lifecycle_fn(move |props: LifecycleProps| {
            let log = Arc::clone(&log);
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                log.lock().push(format!("{tag}:{}", props.props));
                Ok(())
            }
        })
    }

    fn config(log: &Log, mount_delay: Duration) -> ParcelConfig {
        ParcelConfig {
            name: "app".into(),
            instance_id: "app_1_abcdef".into(),
            bootstrap: logged(log, "bootstrap", Duration::ZERO),
            mount: vec![logged(log, "mount", mount_delay)],
            unmount: vec![logged(log, "unmount", Duration::ZERO)],
            update: Some(logged(log, "update", Duration::ZERO)),
        }
    }

    fn parcel(result: Result<ParcelConfig, FrameworkError>, loads: Arc<AtomicUsize>) -> (Arc<MicroApp>, Bus) {
        let bus = Bus::new(32);
        let loader = async move {
            loads.fetch_add(1, Ordering::SeqCst);
            result
        }
        .boxed()
        .shared();
        let app = MicroApp::new(next_parcel_id(), "app", json!(1), loader, bus.clone());
        (app, bus)
    }

    #[tokio::test]
    async fn remount_skips_load_and_bootstrap() {
        let log = testing::log();
        let loads = Arc::new(AtomicUsize::new(0));
        let (app, _) = parcel(Ok(config(&log, Duration::ZERO)), Arc::clone(&loads));
        assert_eq!(app.status(), AppStatus::NotLoaded);

        app.mount().await.unwrap();
        app.unmount().await.unwrap();
        assert_eq!(app.status(), AppStatus::NotMounted);
        app.mount().await.unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(
            *log.lock(),
            vec!["bootstrap:1", "mount:1", "unmount:1", "mount:1"]
        );
        app.unmount_promise().await.unwrap();
        assert_eq!(app.instance_id().as_deref(), Some("app_1_abcdef"));
    }

    #[tokio::test]
    async fn queued_unmount_runs_after_spawned_mount() {
        let log = testing::log();
        let (app, _) = parcel(
            Ok(config(&log, Duration::from_millis(20))),
            Arc::new(AtomicUsize::new(0)),
        );

        app.spawn_mount();
        app.unmount().await.unwrap();

        assert_eq!(*log.lock(), vec!["bootstrap:1", "mount:1", "unmount:1"]);
        app.mount_promise().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_transitions_are_rejected() {
        let log = testing::log();
        let (app, _) = parcel(Ok(config(&log, Duration::ZERO)), Arc::new(AtomicUsize::new(0)));

        let err = app.unmount().await.unwrap_err();
        assert_eq!(err.to_string(), "app 'app' cannot unmount while not_loaded");

        app.mount().await.unwrap();
        assert_eq!(app.mount().await.unwrap_err().as_label(), "invalid_transition");
    }

    #[tokio::test]
    async fn update_passes_new_props() {
        let log = testing::log();
        let (app, _) = parcel(Ok(config(&log, Duration::ZERO)), Arc::new(AtomicUsize::new(0)));
        app.mount().await.unwrap();
        app.update(json!(2)).await.unwrap();
        assert_eq!(app.status(), AppStatus::Mounted);
        assert_eq!(log.lock().last().map(String::as_str), Some("update:2"));
    }

    #[tokio::test]
    async fn load_failure_breaks_the_parcel() {
        let (app, bus) = parcel(
            Err(FrameworkError::LifecycleNotExported { app: "app".into() }),
            Arc::new(AtomicUsize::new(0)),
        );
        let mut rx = bus.subscribe();

        let err = app.mount().await.unwrap_err();
        assert_eq!(err.as_label(), "lifecycle_not_exported");
        assert_eq!(app.status(), AppStatus::Broken);
        assert!(app.load_promise().await.is_err());
        assert!(app.mount_promise().await.is_err());

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::AppBroken);
        assert_eq!(ev.app.as_deref(), Some("app"));

        assert_eq!(app.mount().await.unwrap_err().as_label(), "invalid_transition");
    }

    #[tokio::test]
    async fn failing_mount_hook_breaks_the_parcel() {
        let log = testing::log();
        let mut cfg = config(&log, Duration::ZERO);
        cfg.mount
            .push(lifecycle_fn(|_| async { Err(FrameworkError::hook("boom")) }));
        let (app, _) = parcel(Ok(cfg), Arc::new(AtomicUsize::new(0)));

        let err = app.mount().await.unwrap_err();
        assert_eq!(err.to_string(), "mount of 'app' failed: boom");
        assert_eq!(app.status(), AppStatus::Broken);
        assert!(app.bootstrap_promise().await.is_ok());
    }
}
