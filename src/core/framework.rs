//! # Framework: registration, start-up and manual loading.
//!
//! The [`Framework`] owns the event bus, the [`SubscriberSet`], the global state store,
//! the app registry, the scheduler and the remount cache. It turns descriptors into
//! [`MicroApp`] parcels and hands route-driven ones to the [`Scheduler`].
//!
//! ## High-level architecture
//! ```text
//! register_micro_apps(apps, hooks)
//!   └─► AppRegistry (dedupe by name) ─► MicroApp(lazy: await started ─► load_app) ─► Scheduler
//!
//! start(options)
//!   ├─► store options ─► Prefetcher::run(strategy)
//!   ├─► started.cancel()               (route-driven loaders proceed)
//!   └─► Scheduler::start()
//!
//! load_micro_app(app, config?, hooks?)
//!   └─► RemountCache(key) ─► hit/miss Shared(load_app) ─► wrap_for_remount ─► MicroApp::spawn_mount
//!
//! Event flow:
//!   hook chains / parcels / state ── publish ──► Bus ──► listener ──┬─► MountedTracker::update
//!                                                                  ├─► first AppMounted → FirstAppMounted
//!                                                                  └─► SubscriberSet::emit
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use microvisor::{
//!     ExecutorFn, Framework, FrameworkConfig, FrameworkError, Entry, EntryLoader, FetchOptions,
//!     ImportedEntry, LoadableApp, ModuleExports, lifecycle_fn,
//! };
//!
//! struct Inline;
//!
//! #[async_trait::async_trait]
//! impl EntryLoader for Inline {
//!     async fn load(&self, _e: &Entry, _f: &FetchOptions) -> Result<ImportedEntry, FrameworkError> {
//!         let noop = || lifecycle_fn(|_| async { Ok(()) });
//!         let exports = ModuleExports::new()
//!             .with_bootstrap(noop())
//!             .with_mount(noop())
//!             .with_unmount(noop());
//!         Ok(ImportedEntry {
//!             template: "<p>hello</p>".into(),
//!             executor: ExecutorFn::arc(move |_ctx, _strict| {
//!                 let exports = exports.clone();
//!                 async move { Ok(exports) }
//!             }),
//!             asset_public_path: "/".into(),
//!         })
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), FrameworkError> {
//!     let fw = Framework::builder(FrameworkConfig::default(), Arc::new(Inline)).build();
//!     fw.document().body().append_child(&microvisor::Element::new("div").with_id("root"));
//!
//!     let app = fw.load_micro_app(LoadableApp::new("hello", "//hello").with_container("#root"), None, None);
//!     app.mount_promise().await?;
//!     app.unmount().await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::apps::{FrameworkLifecycles, LoadableApp, RegistrableApp, lifecycle_fn};
use crate::core::config::{FrameworkConfig, LoadConfig, StartOptions};
use crate::core::mounted::MountedTracker;
use crate::core::orchestrator::Orchestrator;
use crate::core::parcel::{AppStatus, LoadFuture, MicroApp, next_parcel_id};
use crate::core::prefetch::{LoadedProbe, Prefetcher};
use crate::core::registry::AppRegistry;
use crate::core::remount::{ContainerApps, RemountCache, cache_key, vacated, wrap_for_remount};
use crate::core::scheduler::{ScheduledApp, Scheduler};
use crate::error::FrameworkError;
use crate::events::{Bus, Event, EventKind};
use crate::host::Document;
use crate::state::{GlobalState, MicroAppStateActions, StateMap};
use crate::subscribers::SubscriberSet;

use super::builder::FrameworkBuilder;

type Parcels = Arc<RwLock<HashMap<String, Arc<MicroApp>>>>;

/// Entry point of the runtime.
pub struct Framework {
    /// Runtime-wide configuration.
    pub cfg: FrameworkConfig,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    mounted: Arc<MountedTracker>,
    orchestrator: Orchestrator,
    registry: AppRegistry,
    scheduler: Arc<dyn Scheduler>,
    remount: RemountCache,
    containers: Arc<ContainerApps>,
    parcels: Parcels,
    options: Arc<RwLock<StartOptions>>,
    started: Mutex<CancellationToken>,
    first_mounted: Arc<Mutex<CancellationToken>>,
    start_once: AtomicBool,
    runtime_token: CancellationToken,
}

impl Framework {
    /// Starts building a framework around `loader`.
    pub fn builder(cfg: FrameworkConfig, loader: Arc<dyn crate::host::EntryLoader>) -> FrameworkBuilder {
        FrameworkBuilder::new(cfg, loader)
    }

    pub(crate) fn new_internal(
        cfg: FrameworkConfig,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        orchestrator: Orchestrator,
        scheduler: Arc<dyn Scheduler>,
    ) -> Arc<Self> {
        let options = StartOptions::default().with_load(cfg.load.clone());
        let fw = Arc::new(Self {
            cfg,
            registry: AppRegistry::new(bus.clone()),
            bus,
            subs,
            mounted: Arc::new(MountedTracker::new()),
            orchestrator,
            scheduler,
            remount: RemountCache::new(),
            containers: Arc::new(ContainerApps::new()),
            parcels: Arc::new(RwLock::new(HashMap::new())),
            options: Arc::new(RwLock::new(options)),
            started: Mutex::new(CancellationToken::new()),
            first_mounted: Arc::new(Mutex::new(CancellationToken::new())),
            start_once: AtomicBool::new(false),
            runtime_token: CancellationToken::new(),
        });
        fw.subscriber_listener();
        fw
    }

    /// Registers route-driven apps. Names already registered are skipped.
    ///
    /// Nothing is fetched here: each app loads on its first activation, and never
    /// before [`start`](Self::start) completed.
    pub fn register_micro_apps(&self, apps: Vec<RegistrableApp>, lifecycles: FrameworkLifecycles) {
        for app in self.registry.register(apps) {
            let name = app.name().to_string();
            let parcel = self.registered_parcel(&app, lifecycles.clone());
            self.parcels.write().insert(name.clone(), Arc::clone(&parcel));
            self.scheduler.register(ScheduledApp {
                name,
                active_when: Arc::clone(&app.active_when),
                parcel,
            });
        }
    }

    fn registered_parcel(&self, app: &RegistrableApp, lifecycles: FrameworkLifecycles) -> Arc<MicroApp> {
        let orchestrator = self.orchestrator.clone();
        let started = self.started.lock().clone();
        let options = Arc::clone(&self.options);
        let indicator = app.loader.clone();
        let descriptor = app.app.clone();

        let loader: LoadFuture = async move {
            if let Some(show) = &indicator {
                show(true);
            }
            started.cancelled().await;
            let config = options.read().load.clone();
            let getter = orchestrator.load_app(descriptor, config, lifecycles).await?;
            let mut parcel = getter.get(None);
            if let Some(show) = indicator {
                let on = Arc::clone(&show);
                parcel.mount.insert(
                    0,
                    lifecycle_fn(move |_| {
                        on(true);
                        async { Ok(()) }
                    }),
                );
                parcel.mount.push(lifecycle_fn(move |_| {
                    show(false);
                    async { Ok(()) }
                }));
            }
            Ok(parcel)
        }
        .boxed()
        .shared();

        MicroApp::new(
            next_parcel_id(),
            app.name(),
            app.app.props.clone(),
            loader,
            self.bus.clone(),
        )
    }

    /// Stores `options`, launches prefetching, releases route-driven loaders and
    /// starts the scheduler. Later calls are no-ops.
    pub async fn start(&self, options: StartOptions) -> Result<(), FrameworkError> {
        if self.start_once.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        *self.options.write() = options.clone();

        let prefetcher = Prefetcher {
            loader: Arc::clone(&self.orchestrator.entry_loader),
            bus: self.bus.clone(),
            fetch: options.load.fetch.clone(),
        };
        let parcels = Arc::clone(&self.parcels);
        let is_loaded: LoadedProbe = Arc::new(move |name| {
            parcels
                .read()
                .get(name)
                .is_some_and(|p| p.status() != AppStatus::NotLoaded)
        });
        let first_mounted = self.first_mounted.lock().clone();
        drop(prefetcher.run(&options.prefetch, &self.registry.list(), first_mounted, is_loaded));

        self.started.lock().cancel();
        self.bus.publish(Event::new(EventKind::FrameworkStarted));
        self.scheduler.start().await
    }

    /// Forwards a location change to the scheduler.
    pub async fn reroute(&self, location: &str) -> Result<(), FrameworkError> {
        self.scheduler.reroute(location).await
    }

    /// Loads an app on demand and mounts it in the background.
    ///
    /// Without `config`, the started load configuration is used with `singular = false`.
    /// Loads sharing a cache key converge on one fetch and one script evaluation.
    /// Must be called inside a tokio runtime.
    pub fn load_micro_app(
        &self,
        app: LoadableApp,
        config: Option<LoadConfig>,
        lifecycles: Option<FrameworkLifecycles>,
    ) -> Arc<MicroApp> {
        let config = config.unwrap_or_else(|| self.options.read().load.clone().with_singular(false));
        let lifecycles = lifecycles.unwrap_or_default();
        let document = &self.orchestrator.document;
        let xpath = app
            .container
            .as_ref()
            .and_then(|target| target.resolve(document))
            .and_then(|el| document.xpath(&el));
        let key = cache_key(&app.name, xpath.as_deref(), config.cache_by_app_name);

        let (entry, cached) = self.remount.get_or_insert_with(&key, || {
            let orchestrator = self.orchestrator.clone();
            let app = app.clone();
            async move { orchestrator.load_app(app, config, lifecycles).await }
                .boxed()
                .shared()
        });
        if cached {
            self.bus.publish(
                Event::new(EventKind::RemountCacheHit)
                    .with_app(app.name.as_str())
                    .with_reason(key),
            );
        }

        let id = next_parcel_id();
        let predecessors = xpath.clone().map(|path| {
            let containers = Arc::clone(&self.containers);
            move || containers.before(&path, id)
        });
        let target = app.container.clone();
        let loader: LoadFuture = async move {
            let getter = entry.getter.await?;
            Ok(wrap_for_remount(getter.get(target), cached, entry.bootstrapped, predecessors))
        }
        .boxed()
        .shared();

        let parcel = MicroApp::new(id, app.name.as_str(), app.props.clone(), loader, self.bus.clone());
        if let Some(path) = xpath {
            self.containers.push(&path, Arc::clone(&parcel));
            self.release_container_when_vacated(path, Arc::clone(&parcel));
        }
        parcel.spawn_mount();
        parcel
    }

    /// Drops `parcel` from its container list once it has unmounted or broken.
    fn release_container_when_vacated(&self, xpath: String, parcel: Arc<MicroApp>) {
        let containers = Arc::clone(&self.containers);
        let rt = self.runtime_token.clone();
        let id = parcel.id();
        tokio::spawn(async move {
            tokio::select! {
                _ = rt.cancelled() => {}
                _ = vacated(&parcel) => containers.remove(&xpath, id),
            }
        });
    }

    /// Seeds the global state and returns master actions.
    pub fn init_global_state(&self, initial: StateMap) -> MicroAppStateActions {
        self.orchestrator.state.init(initial)
    }

    /// State actions bound to `id`.
    pub fn get_micro_app_state_actions(&self, id: &str, is_master: bool) -> MicroAppStateActions {
        self.orchestrator.state.actions(id, is_master)
    }

    pub fn global_state(&self) -> &Arc<GlobalState> {
        &self.orchestrator.state
    }

    /// Runs `f` once the first app of the session mounted (immediately-ish if it already did).
    pub fn run_after_first_mounted<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.first_mounted.lock().clone();
        tokio::spawn(async move {
            token.cancelled().await;
            f();
        });
    }

    /// Sorted names of currently mounted apps (eventually consistent).
    pub async fn mounted_apps(&self) -> Vec<String> {
        self.mounted.snapshot().await
    }

    /// Names of registered route-driven apps, in registration order.
    pub fn registered_apps(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Parcel of a registered route-driven app.
    pub fn registered_parcel_of(&self, name: &str) -> Option<Arc<MicroApp>> {
        self.parcels.read().get(name).cloned()
    }

    pub fn document(&self) -> &Document {
        &self.orchestrator.document
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Receiver of every runtime event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subs.len()
    }

    /// Clears every process-scoped registry and returns to the not-started state.
    /// Mounted apps are left as they are.
    pub async fn reset(&self) {
        self.registry.reset();
        self.scheduler.reset();
        self.remount.clear();
        self.containers.clear();
        self.parcels.write().clear();
        self.orchestrator.state.reset();
        self.orchestrator.barrier.reset();
        self.mounted.clear().await;
        *self.options.write() = StartOptions::default().with_load(self.cfg.load.clone());
        *self.started.lock() = CancellationToken::new();
        *self.first_mounted.lock() = CancellationToken::new();
        self.start_once.store(false, Ordering::SeqCst);
    }

    /// Subscribes to the bus: tracks mounted apps, detects the first mount and
    /// forwards events to the subscriber set.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let bus = self.bus.clone();
        let subs = Arc::clone(&self.subs);
        let mounted = Arc::clone(&self.mounted);
        let first = Arc::clone(&self.first_mounted);
        let rt = self.runtime_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = rt.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => {
                            mounted.update(&ev).await;
                            if ev.kind == EventKind::AppMounted {
                                let token = first.lock().clone();
                                if !token.is_cancelled() {
                                    token.cancel();
                                    let mut first_ev = Event::new(EventKind::FirstAppMounted);
                                    if let Some(app) = &ev.app {
                                        first_ev = first_ev.with_app(Arc::clone(app));
                                    }
                                    bus.publish(first_ev);
                                }
                            }
                            subs.emit(&ev);
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });
    }
}

impl Drop for Framework {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::core::scheduler::ActivityScheduler;
    use crate::policies::SandboxConfig;
    use crate::testing::{self, FakeApp, FakeLoader, Log};

    fn framework(loader: Arc<FakeLoader>, scheduler: ActivityScheduler) -> Arc<Framework> {
        Framework::builder(FrameworkConfig::default(), loader)
            .with_document(testing::document())
            .with_scheduler(Arc::new(scheduler))
            .build()
    }

    fn state(value: serde_json::Value) -> StateMap {
        value.as_object().cloned().unwrap_or_default()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn duplicate_names_register_once() {
        let log = testing::log();
        let react = FakeApp::new("react", &log);
        let fw = framework(FakeLoader::new([react.clone()]), ActivityScheduler::new());

        fw.register_micro_apps(
            vec![
                RegistrableApp::new("react", react.entry(), |_| false).with_container("#c1"),
                RegistrableApp::new("react", "//other", |_| false).with_container("#c2"),
            ],
            FrameworkLifecycles::new(),
        );
        fw.register_micro_apps(
            vec![RegistrableApp::new("react", "//third", |_| false)],
            FrameworkLifecycles::new(),
        );
        assert_eq!(fw.registered_apps(), vec!["react"]);
    }

    #[tokio::test]
    async fn route_driven_apps_wait_for_start() {
        let log = testing::log();
        let react = FakeApp::new("react", &log);
        let loader = FakeLoader::new([react.clone()]);
        let fw = framework(Arc::clone(&loader), ActivityScheduler::at("/react"));
        let shown: Log = testing::log();
        let sink = Arc::clone(&shown);

        fw.register_micro_apps(
            vec![
                RegistrableApp::new("react", react.entry(), |loc| loc.starts_with("/react"))
                    .with_container("#c1")
                    .with_loader(move |on| sink.lock().push(on.to_string())),
            ],
            FrameworkLifecycles::new(),
        );
        fw.reroute("/react").await.unwrap();
        assert_eq!(loader.loads(), 0);

        fw.start(StartOptions::default().with_prefetch(false)).await.unwrap();
        assert_eq!(loader.loads(), 1);
        assert_eq!(react.counters.get("mount"), 1);
        assert_eq!(*shown.lock(), vec!["true", "true", "false"]);
        assert_eq!(
            fw.registered_parcel_of("react").map(|p| p.status()),
            Some(AppStatus::Mounted)
        );

        settle().await;
        assert_eq!(fw.mounted_apps().await, vec!["react"]);

        fw.reroute("/elsewhere").await.unwrap();
        assert_eq!(react.counters.get("unmount"), 1);
        settle().await;
        assert!(fw.mounted_apps().await.is_empty());
    }

    #[tokio::test]
    async fn singular_route_switch_unmounts_before_mounting() {
        let log = testing::log();
        let react = FakeApp::new("react", &log).with_unmount_delay(Duration::from_millis(20));
        let vue = FakeApp::new("vue", &log);
        let fw = framework(
            FakeLoader::new([react.clone(), vue.clone()]),
            ActivityScheduler::at("/react"),
        );
        fw.register_micro_apps(
            vec![
                RegistrableApp::new("react", react.entry(), |l| l == "/react").with_container("#c1"),
                RegistrableApp::new("vue", vue.entry(), |l| l == "/vue").with_container("#c1"),
            ],
            FrameworkLifecycles::new(),
        );
        fw.start(StartOptions::default().with_prefetch(false)).await.unwrap();
        fw.reroute("/vue").await.unwrap();

        assert!(testing::pos(&log, "react:unmount:end") < testing::pos(&log, "vue:mount:start"));
    }

    #[tokio::test]
    async fn concurrent_manual_loads_evaluate_once() {
        let log = testing::log();
        let react = FakeApp::new("react", &log);
        let loader = FakeLoader::new([react.clone()]);
        let fw = framework(Arc::clone(&loader), ActivityScheduler::new());
        let mut rx = fw.subscribe();

        let descriptor = LoadableApp::new("react", react.entry()).with_container("#c1");
        let first = fw.load_micro_app(descriptor.clone(), None, None);
        let second = fw.load_micro_app(descriptor, None, None);

        first.mount_promise().await.unwrap();
        settle().await;
        // Same container: the second handle waits for the first to unmount.
        assert_eq!(react.counters.get("mount"), 1);
        first.unmount().await.unwrap();
        second.mount_promise().await.unwrap();
        assert!(testing::pos(&log, "react:unmount:end") < testing::positions(&log, "react:mount:start")[1]);

        assert_eq!(loader.loads(), 1);
        assert_eq!(react.counters.get("executions"), 1);
        assert_eq!(react.counters.get("bootstrap"), 1);
        assert_eq!(react.counters.get("mount"), 2);
        assert!(
            testing::drain(&mut rx)
                .iter()
                .any(|e| e.kind == EventKind::RemountCacheHit)
        );
    }

    #[tokio::test]
    async fn same_container_loads_mount_one_after_another() {
        let log = testing::log();
        let react = FakeApp::new("react", &log).with_bootstrap_delay(Duration::from_millis(10));
        let fw = framework(FakeLoader::new([react.clone()]), ActivityScheduler::new());
        let cfg = LoadConfig::manual().with_sandbox(SandboxConfig::Disabled);

        let descriptor = LoadableApp::new("react", react.entry()).with_container("#c1");
        let first = fw.load_micro_app(descriptor.clone(), Some(cfg.clone()), None);
        let second = fw.load_micro_app(descriptor, Some(cfg), None);

        first.mount_promise().await.unwrap();
        settle().await;
        assert_eq!(react.counters.get("mount"), 1);
        assert_eq!(second.status(), AppStatus::Mounting);

        first.unmount().await.unwrap();
        second.mount_promise().await.unwrap();

        let mounts = testing::positions(&log, "react:mount:start");
        assert_eq!(mounts.len(), 2);
        assert!(testing::pos(&log, "react:bootstrap:end") < mounts[0]);
        assert!(testing::pos(&log, "react:unmount:end") < mounts[1]);
        assert_eq!(react.counters.get("bootstrap"), 1);
        assert_eq!(first.status(), AppStatus::NotMounted);
        assert_eq!(second.status(), AppStatus::Mounted);
    }

    #[tokio::test]
    async fn vacated_parcels_leave_the_container_list() {
        let log = testing::log();
        let react = FakeApp::new("react", &log);
        let fw = framework(FakeLoader::new([react.clone()]), ActivityScheduler::new());
        let descriptor = LoadableApp::new("react", react.entry()).with_container("#c1");

        for _ in 0..5 {
            let app = fw.load_micro_app(descriptor.clone(), None, None);
            app.mount_promise().await.unwrap();
            app.unmount().await.unwrap();
        }
        let ghost = fw.load_micro_app(LoadableApp::new("ghost", "//ghost").with_container("#c2"), None, None);
        assert!(ghost.mount_promise().await.is_err());
        settle().await;

        assert_eq!(fw.containers.total(), 0);
        assert_eq!(react.counters.get("mount"), 5);
        assert_eq!(react.counters.get("bootstrap"), 1);
    }

    #[tokio::test]
    async fn first_mount_triggers_callbacks_and_prefetch() {
        let log = testing::log();
        let react = FakeApp::new("react", &log);
        let vue = FakeApp::new("vue", &log);
        let loader = FakeLoader::new([react.clone(), vue.clone()]);
        let fw = framework(Arc::clone(&loader), ActivityScheduler::new());
        fw.register_micro_apps(
            vec![RegistrableApp::new("vue", vue.entry(), |_| false).with_container("#c2")],
            FrameworkLifecycles::new(),
        );
        fw.start(StartOptions::default()).await.unwrap();

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        fw.run_after_first_mounted(move || flag.store(true, Ordering::SeqCst));
        settle().await;
        assert!(!fired.load(Ordering::SeqCst));
        assert!(loader.prefetched.lock().is_empty());

        let app = fw.load_micro_app(LoadableApp::new("react", react.entry()).with_container("#c1"), None, None);
        app.mount_promise().await.unwrap();
        settle().await;

        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(*loader.prefetched.lock(), vec!["//vue"]);
    }

    #[tokio::test]
    async fn manual_load_errors_surface_on_the_parcel() {
        let fw = framework(FakeLoader::new([]), ActivityScheduler::new());
        let app = fw.load_micro_app(LoadableApp::new("ghost", "//ghost").with_container("#c1"), None, None);

        let err = app.mount_promise().await.unwrap_err();
        assert_eq!(err.as_label(), "entry_load_failed");
        assert_eq!(app.status(), AppStatus::Broken);
    }

    #[tokio::test]
    async fn global_state_round_trip() {
        let fw = framework(FakeLoader::new([]), ActivityScheduler::new());
        let master = fw.init_global_state(state(json!({ "a": 1 })));
        assert!(master.set_global_state(state(json!({ "a": 2 }))));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let consumer = fw.get_micro_app_state_actions("react_1", false);
        consumer.on_global_state_change(
            move |next, prev| sink.lock().push((next.clone(), prev.clone())),
            true,
        );

        let expected = state(json!({ "a": 2 }));
        assert_eq!(*seen.lock(), vec![(expected.clone(), expected)]);
        assert!(!consumer.set_global_state(state(json!({ "b": 1 }))));
    }

    #[tokio::test]
    async fn reset_forgets_registrations_and_start() {
        let log = testing::log();
        let react = FakeApp::new("react", &log);
        let fw = framework(FakeLoader::new([react.clone()]), ActivityScheduler::new());
        fw.register_micro_apps(
            vec![RegistrableApp::new("react", react.entry(), |_| false).with_container("#c1")],
            FrameworkLifecycles::new(),
        );
        fw.start(StartOptions::default()).await.unwrap();

        fw.reset().await;
        assert!(fw.registered_apps().is_empty());
        assert!(fw.global_state().snapshot().is_empty());

        fw.register_micro_apps(
            vec![RegistrableApp::new("react", react.entry(), |_| false).with_container("#c1")],
            FrameworkLifecycles::new(),
        );
        assert_eq!(fw.registered_apps(), vec!["react"]);
    }
}
