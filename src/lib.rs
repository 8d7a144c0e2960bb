//! # microvisor
//!
//! **Microvisor** composes independently built front-end modules ("micro-apps") at
//! runtime: it fetches their entries, isolates their global context and styles,
//! drives them through a load → bootstrap → mount → unmount lifecycle and lets them
//! share state.
//!
//! The crate does no fetching, HTML parsing, URL matching or property trapping of its
//! own. Those are collaborators the host plugs in ([`EntryLoader`], [`SandboxFactory`],
//! [`Scheduler`]); an in-memory [`Document`] stands in for the host page.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   RegistrableApp      RegistrableApp         LoadableApp
//!   (route-driven)      (route-driven)         (on demand)
//!         │                   │                     │
//!         ▼                   ▼                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Framework                                                        │
//! │  - AppRegistry (dedupe by name)                                   │
//! │  - RemountCache (one in-flight load per key)                      │
//! │  - GlobalState (cross-app store)                                  │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────────────────────────────────┬─────────────┘
//!        ▼                                              ▼
//!   Scheduler ──► MicroApp parcels ◄──────────── load_micro_app
//!                       │
//!                       ▼
//!               Orchestrator::load_app ──► EntryLoader, SandboxFactory, ScriptExecutor
//!                       │
//!                       ▼
//!               ConfigGetter::get(container) ──► { bootstrap, mount[], unmount[], update? }
//!
//!  hook chains / parcels / state ── publish ──► Bus ──► listener ──┬─► MountedTracker
//!                                                                  └─► SubscriberSet ─► workers
//! ```
//!
//! ### Lifecycle
//! ```text
//! NotLoaded ─► load (fetch, sandbox, before_load, execute, discover exports)
//!           ─► bootstrap (once per instance)
//!           ─► mount chain:   [singular wait] render ─ sandbox.mount ─ before_mount
//!                             ─ app.mount ─ render ─ after_mount ─ [arm barrier]
//!           ─► unmount chain: before_unmount ─ app.unmount ─ sandbox.unmount
//!                             ─ after_unmount ─ release wrapper ─ [release barrier]
//!           ─► mount again (no load, no bootstrap)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Framework**     | Registration, start-up, on-demand loading.                   | [`Framework`], [`FrameworkBuilder`]         |
//! | **Parcels**       | Drive one loaded app through its states.                     | [`MicroApp`], [`AppStatus`]                 |
//! | **Descriptors**   | Describe apps and their lifecycle exports.                   | [`LoadableApp`], [`RegistrableApp`]         |
//! | **Host seams**    | Plug in loading, isolation and routing.                      | [`EntryLoader`], [`SandboxFactory`], [`Scheduler`] |
//! | **Global state**  | Share keyed state between apps.                              | [`GlobalState`], [`MicroAppStateActions`]   |
//! | **Policies**      | Singular mode, sandboxing, prefetching.                      | [`SingularMode`], [`SandboxConfig`], [`PrefetchStrategy`] |
//! | **Subscriber API**| Observe runtime events.                                      | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors with stable labels.                             | [`FrameworkError`]                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use microvisor::{
//!     Entry, EntryLoader, ExecutorFn, FetchOptions, Framework, FrameworkConfig,
//!     FrameworkError, FrameworkLifecycles, ImportedEntry, ModuleExports, RegistrableApp,
//!     StartOptions, lifecycle_fn,
//! };
//!
//! struct Static;
//!
//! #[async_trait::async_trait]
//! impl EntryLoader for Static {
//!     async fn load(&self, entry: &Entry, _f: &FetchOptions) -> Result<ImportedEntry, FrameworkError> {
//!         let name = entry.to_string();
//!         let mount = lifecycle_fn(move |props| {
//!             let name = name.clone();
//!             async move {
//!                 println!("{name} mounted into {:?}", props.container.map(|c| c.id()));
//!                 Ok(())
//!             }
//!         });
//!         let noop = || lifecycle_fn(|_| async { Ok(()) });
//!         let exports = ModuleExports::new()
//!             .with_bootstrap(noop())
//!             .with_mount(mount)
//!             .with_unmount(noop());
//!         Ok(ImportedEntry {
//!             template: "<div class=\"app\"></div>".into(),
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
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn microvisor::Subscribe>> = vec![Arc::new(microvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn microvisor::Subscribe>> = Vec::new();
//!
//!     let fw = Framework::builder(FrameworkConfig::default(), Arc::new(Static))
//!         .with_subscribers(subs)
//!         .build();
//!     fw.document().body().append_child(&microvisor::Element::new("div").with_id("subapp"));
//!
//!     fw.register_micro_apps(
//!         vec![RegistrableApp::new("react", "//localhost:7100", |loc| loc.starts_with("/react"))
//!             .with_container("#subapp")],
//!         FrameworkLifecycles::new(),
//!     );
//!     fw.start(StartOptions::default()).await?;
//!     fw.reroute("/react").await?;
//!     Ok(())
//! }
//! ```
mod apps;
mod core;
mod error;
mod events;
mod host;
mod policies;
mod state;
mod subscribers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use apps::{
    ActiveWhen, BoxResultFuture, Entry, EntryManifest, FrameworkLifecycles, Hook, HookContext,
    HookPhase, LegacyRender, LegacyRenderProps, LifecycleExports, LifecycleFn, LifecycleHook,
    LifecycleProps, LoadableApp, LoadingIndicator, ModuleExports, MountTarget, RegistrableApp,
    RenderPhase, lifecycle_fn, lifecycle_hook,
};
pub use core::{
    ActivityScheduler, AppStatus, ConfigGetter, ENGINE_FLAG, EXPORT_SOURCES, ExportSource,
    Framework, FrameworkBuilder, FrameworkConfig, HEAD_TAG, LoadConfig, LoadFuture, MicroApp,
    MountedTracker, PUBLIC_PATH_KEY, ParcelConfig, ScheduledApp, Scheduler, StartOptions,
    wrapper_id,
};
pub use error::FrameworkError;
pub use events::{Bus, Event, EventKind};
pub use host::{
    AssetFilter, Document, Element, ElementGetter, EntryLoader, ExecutionContext, ExecutorFn,
    FetchOptions, GlobalValue, ImportedEntry, NoopSandbox, NoopSandboxFactory, RealmSandbox,
    RealmSandboxFactory, Sandbox, SandboxFactory, SandboxOptions, ScriptExecutor, styles,
};
pub use policies::{PrefetchSplit, PrefetchStrategy, SandboxConfig, SingularMode};
pub use state::{GlobalState, MicroAppStateActions, StateCallback, StateMap};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
