//! # Lifecycle orchestrator.
//!
//! [`Orchestrator::load_app`] realizes one instance of a descriptor and returns a
//! [`ConfigGetter`]. The getter can be called any number of times, with different
//! mount targets, without fetching or evaluating the app again.
//!
//! ## Load (once per instance)
//! ```text
//! validate config ─► fetch entry ─► [singular: await barrier] ─► build wrapper
//!   ─► render(loading) ─► create sandbox ─► merge add-ons ++ caller hooks
//!   ─► before_load ─► execute scripts ─► discover exports ─► bind state actions
//! ```
//!
//! ## Mount chain
//! ```text
//! mark ─► [singular: await barrier] ─► (re)create wrapper + render(mounting)
//!   ─► sandbox.mount ─► before_mount ─► app.mount ─► render(mounted)
//!   ─► after_mount ─► [singular: arm barrier] ─► measure
//! ```
//!
//! ## Unmount chain
//! ```text
//! before_unmount ─► app.unmount ─► sandbox.unmount ─► after_unmount
//!   ─► render(unmounted) + drop state listener + release wrapper
//!   ─► [singular: release barrier]
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::Value;

use crate::apps::{
    FrameworkLifecycles, Hook, HookContext, HookPhase, LegacyRender, LifecycleExports,
    LifecycleFn, LifecycleProps, LoadableApp, MountTarget, RenderPhase, lifecycle_fn,
};
use crate::core::barrier::SingularBarrier;
use crate::core::config::LoadConfig;
use crate::core::exports::{self, Discovery};
use crate::core::hooks::run_hooks;
use crate::core::wrapper::{Renderer, WrapperTemplate};
use crate::core::addons;
use crate::error::FrameworkError;
use crate::events::{Bus, Event, EventKind};
use crate::host::{
    Document, Element, EntryLoader, ExecutionContext, Sandbox, SandboxFactory, SandboxOptions,
};
use crate::state::{GlobalState, MicroAppStateActions, unix_ms};

/// Hook set handed to a parcel: what the scheduler substrate runs.
#[derive(Clone)]
pub struct ParcelConfig {
    /// App name.
    pub name: String,
    /// Instance id.
    pub instance_id: Arc<str>,
    pub bootstrap: LifecycleFn,
    pub mount: Vec<Hook>,
    pub unmount: Vec<Hook>,
    pub update: Option<LifecycleFn>,
}

impl fmt::Debug for ParcelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParcelConfig")
            .field("name", &self.name)
            .field("instance_id", &self.instance_id)
            .field("mount", &self.mount.len())
            .field("unmount", &self.unmount.len())
            .field("update", &self.update.is_some())
            .finish()
    }
}

/// Collaborators injected into the orchestrator.
#[derive(Clone)]
pub(crate) struct Orchestrator {
    pub(crate) bus: Bus,
    pub(crate) document: Document,
    pub(crate) global: ExecutionContext,
    pub(crate) entry_loader: Arc<dyn EntryLoader>,
    pub(crate) sandbox_factory: Arc<dyn SandboxFactory>,
    pub(crate) state: Arc<GlobalState>,
    pub(crate) barrier: Arc<SingularBarrier>,
}

impl Orchestrator {
    /// Loads one instance of `app`.
    pub(crate) async fn load_app(
        &self,
        app: LoadableApp,
        config: LoadConfig,
        lifecycles: FrameworkLifecycles,
    ) -> Result<ConfigGetter, FrameworkError> {
        let name = app.name.clone();
        let started = Instant::now();
        self.bus
            .publish(Event::new(EventKind::AppLoading).with_app(name.as_str()));

        match self.load_instance(app, config, lifecycles).await {
            Ok(instance) => {
                self.bus.publish(
                    Event::new(EventKind::AppLoaded)
                        .with_app(name.as_str())
                        .with_instance(Arc::clone(&instance.instance_id))
                        .with_elapsed(started.elapsed()),
                );
                Ok(ConfigGetter { instance })
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::AppLoadFailed)
                        .with_app(name.as_str())
                        .with_reason(e.to_string()),
                );
                Err(e)
            }
        }
    }

    async fn load_instance(
        &self,
        app: LoadableApp,
        config: LoadConfig,
        lifecycles: FrameworkLifecycles,
    ) -> Result<Arc<Instance>, FrameworkError> {
        validate(&app, &config)?;
        let instance_id: Arc<str> = generate_instance_id(&app.name).into();

        let entry = self
            .entry_loader
            .load(&app.entry, &config.fetch)
            .await
            .map_err(|e| with_app(e, &app.name, Failure::Entry))?;

        let singular = config.singular.applies(&app);
        if singular {
            self.barrier.wait().await;
        }

        let template = WrapperTemplate::new(&instance_id, &app.name, &config.sandbox, &entry.template);
        let initial = template.build(&self.document, &self.bus);
        let renderer = Renderer {
            instance_id: instance_id.to_string(),
            container: app.container.clone(),
            legacy: app.render.clone(),
            document: self.document.clone(),
        };
        renderer.render(Some(&initial), RenderPhase::Loading)?;

        let current = Arc::new(Mutex::new(Some(initial.clone())));
        let (sandbox, global, strict) = self.create_sandbox(&app, &config, &current)?;

        let lifecycles = addons::builtin(&entry.asset_public_path).merge(&lifecycles);
        let ctx = HookContext {
            app_name: app.name.as_str().into(),
            instance_id: Arc::clone(&instance_id),
            global: global.clone(),
            props: app.props.clone(),
        };
        run_hooks(lifecycles.hooks(HookPhase::BeforeLoad), &ctx, HookPhase::BeforeLoad).await?;

        let module = entry
            .executor
            .execute(&global, strict)
            .await
            .map_err(|e| with_app(e, &app.name, Failure::Script))?;
        let (_, exports) = exports::resolve(&Discovery {
            app_name: &app.name,
            module: &module,
            global: &global,
            latest_set_prop: sandbox.as_ref().and_then(|s| s.latest_set_prop()),
        })?;

        let state = self.state.actions(Arc::clone(&instance_id), false);

        Ok(Arc::new(Instance {
            app_name: app.name,
            instance_id,
            props: app.props,
            initial_container: app.container,
            legacy: app.render,
            template,
            initial_element: Mutex::new(Some(initial)),
            current_element: current,
            sandbox,
            hook_ctx: ctx,
            exports,
            lifecycles,
            singular,
            state,
            bus: self.bus.clone(),
            document: self.document.clone(),
            barrier: Arc::clone(&self.barrier),
        }))
    }

    /// Creates the sandbox, if enabled. Returns it with the execution context and
    /// whether scripts run in strict mode.
    #[allow(clippy::type_complexity)]
    fn create_sandbox(
        &self,
        app: &LoadableApp,
        config: &LoadConfig,
        current: &Arc<Mutex<Option<Element>>>,
    ) -> Result<(Option<Arc<dyn Sandbox>>, ExecutionContext, bool), FrameworkError> {
        if !config.sandbox.is_enabled() {
            return Ok((None, self.global.clone(), false));
        }
        let mut loose = config.sandbox.loose();
        if !loose && !self.sandbox_factory.supports_strict() {
            loose = true;
            self.bus.publish(
                Event::new(EventKind::SandboxDegraded)
                    .with_app(app.name.as_str())
                    .with_reason("strict_sandbox"),
            );
        }
        let getter = Arc::clone(current);
        let sandbox = self
            .sandbox_factory
            .create(SandboxOptions {
                app_name: app.name.clone(),
                element_getter: Arc::new(move || getter.lock().clone()),
                scoped_css: config.sandbox.scoped_css(),
                loose,
                exclude_asset_filter: config.exclude_asset_filter.clone(),
            })
            .map_err(|e| with_app(e, &app.name, Failure::Sandbox))?;
        let global = sandbox.execution_context();
        Ok((Some(sandbox), global, !loose))
    }
}

fn validate(app: &LoadableApp, config: &LoadConfig) -> Result<(), FrameworkError> {
    let styled = config.sandbox.strict_style_isolation() || config.sandbox.scoped_css();
    if app.render.is_some() && styled {
        return Err(FrameworkError::IncompatibleRender {
            app: app.name.clone(),
        });
    }
    if app.render.is_none() && app.container.is_none() {
        return Err(FrameworkError::InvalidConfig {
            app: app.name.clone(),
            reason: "either a container or a render function is required".into(),
        });
    }
    Ok(())
}

enum Failure {
    Entry,
    Script,
    Sandbox,
}

/// Attaches the app name to collaborator errors raised without one.
fn with_app(e: FrameworkError, app: &str, kind: Failure) -> FrameworkError {
    let FrameworkError::Hook { error } = e else {
        return e;
    };
    let app = app.to_string();
    match kind {
        Failure::Entry => FrameworkError::EntryLoad { app, error },
        Failure::Script => FrameworkError::ScriptExecution { app, error },
        Failure::Sandbox => FrameworkError::Sandbox { app, error },
    }
}

/// `<name>_<unix ms>_<6 random lowercase alphanumerics>`.
pub(crate) fn generate_instance_id(name: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{name}_{}_{suffix}", unix_ms())
}

/// One realized execution of a descriptor.
struct Instance {
    app_name: String,
    instance_id: Arc<str>,
    props: Value,
    initial_container: Option<MountTarget>,
    legacy: Option<LegacyRender>,
    template: WrapperTemplate,
    /// Wrapper rendered at load time, handed to the first mount into the initial container.
    initial_element: Mutex<Option<Element>>,
    /// Wrapper the sandbox sees.
    current_element: Arc<Mutex<Option<Element>>>,
    sandbox: Option<Arc<dyn Sandbox>>,
    hook_ctx: HookContext,
    exports: LifecycleExports,
    lifecycles: FrameworkLifecycles,
    singular: bool,
    state: MicroAppStateActions,
    bus: Bus,
    document: Document,
    barrier: Arc<SingularBarrier>,
}

impl Instance {
    async fn run_phase(&self, phase: HookPhase) -> Result<(), FrameworkError> {
        run_hooks(self.lifecycles.hooks(phase), &self.hook_ctx, phase).await
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_app(self.app_name.as_str())
            .with_instance(Arc::clone(&self.instance_id))
    }
}

/// Yields parcel configs of one loaded instance.
#[derive(Clone)]
pub struct ConfigGetter {
    instance: Arc<Instance>,
}

impl ConfigGetter {
    pub fn app_name(&self) -> &str {
        &self.instance.app_name
    }

    pub fn instance_id(&self) -> &str {
        &self.instance.instance_id
    }

    /// State actions bound to this instance.
    pub fn state_actions(&self) -> &MicroAppStateActions {
        &self.instance.state
    }

    /// Builds the hook set for a mount target; `None` keeps the load-time container.
    pub fn get(&self, remount_container: Option<MountTarget>) -> ParcelConfig {
        let inst = &self.instance;
        let container = remount_container.or_else(|| inst.initial_container.clone());
        let use_new_container = container != inst.initial_container;
        let placement = Arc::new(Placement {
            instance: Arc::clone(inst),
            renderer: Renderer {
                instance_id: inst.instance_id.to_string(),
                container,
                legacy: inst.legacy.clone(),
                document: inst.document.clone(),
            },
            element: Mutex::new(None),
            use_new_container,
            mark: Mutex::new(None),
        });

        ParcelConfig {
            name: inst.app_name.clone(),
            instance_id: Arc::clone(&inst.instance_id),
            bootstrap: inst.exports.bootstrap.clone(),
            mount: placement.mount_chain(),
            unmount: placement.unmount_chain(),
            update: placement.update(),
        }
    }
}

impl fmt::Debug for ConfigGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigGetter")
            .field("app", &self.instance.app_name)
            .field("instance_id", &self.instance.instance_id)
            .finish()
    }
}

/// One instance bound to one mount target.
struct Placement {
    instance: Arc<Instance>,
    renderer: Renderer,
    element: Mutex<Option<Element>>,
    use_new_container: bool,
    mark: Mutex<Option<Instant>>,
}

fn step<F, Fut>(p: &Arc<Placement>, f: F) -> Hook
where
    F: Fn(Arc<Placement>, LifecycleProps) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), FrameworkError>> + Send + 'static,
{
    let p = Arc::clone(p);
    lifecycle_fn(move |props| f(Arc::clone(&p), props))
}

impl Placement {
    /// Wrapper for the next mount: reused when still alive in the same target,
    /// otherwise rebuilt.
    fn prepare_element(&self) -> Element {
        let inst = &self.instance;
        let mut slot = self.element.lock();
        let reuse = if self.use_new_container {
            None
        } else {
            slot.clone()
                .or_else(|| inst.initial_element.lock().take())
        };
        let el = reuse.unwrap_or_else(|| inst.template.build(&inst.document, &inst.bus));
        *slot = Some(el.clone());
        *inst.current_element.lock() = Some(el.clone());
        el
    }

    fn element(&self) -> Option<Element> {
        self.element.lock().clone()
    }

    fn release_element(&self) {
        *self.element.lock() = None;
        *self.instance.current_element.lock() = None;
    }

    /// Props for the app's own functions: caller props plus wrapper and state actions.
    fn app_props(&self, mut props: LifecycleProps, with_state: bool) -> LifecycleProps {
        if props.props.is_null() {
            props.props = self.instance.props.clone();
        }
        props.container = self.element();
        if with_state {
            props.state = Some(self.instance.state.clone());
        }
        props
    }

    fn mount_chain(self: &Arc<Self>) -> Vec<Hook> {
        vec![
            step(self, |p, _| async move {
                *p.mark.lock() = Some(Instant::now());
                p.instance.bus.publish(p.instance.event(EventKind::AppMounting));
                Ok(())
            }),
            step(self, |p, _| async move {
                if p.instance.singular {
                    p.instance.barrier.wait().await;
                }
                Ok(())
            }),
            step(self, |p, _| async move {
                let el = p.prepare_element();
                p.renderer.render(Some(&el), RenderPhase::Mounting)
            }),
            step(self, |p, _| async move {
                match &p.instance.sandbox {
                    Some(sandbox) => sandbox.mount().await,
                    None => Ok(()),
                }
            }),
            step(self, |p, _| async move {
                p.instance.run_phase(HookPhase::BeforeMount).await
            }),
            step(self, |p, props| async move {
                let props = p.app_props(props, true);
                (p.instance.exports.mount)(props)
                    .await
                    .map_err(|e| e.in_phase(&p.instance.app_name, "mount"))
            }),
            step(self, |p, _| async move {
                p.renderer
                    .render(p.element().as_ref(), RenderPhase::Mounted)
            }),
            step(self, |p, _| async move {
                p.instance.run_phase(HookPhase::AfterMount).await
            }),
            step(self, |p, _| async move {
                if p.instance.singular {
                    p.instance.barrier.arm();
                }
                Ok(())
            }),
            step(self, |p, _| async move {
                let mut ev = p.instance.event(EventKind::AppMounted);
                if let Some(mark) = p.mark.lock().take() {
                    ev = ev.with_elapsed(mark.elapsed());
                }
                p.instance.bus.publish(ev);
                Ok(())
            }),
        ]
    }

    fn unmount_chain(self: &Arc<Self>) -> Vec<Hook> {
        vec![
            step(self, |p, _| async move {
                p.instance
                    .bus
                    .publish(p.instance.event(EventKind::AppUnmounting));
                p.instance.run_phase(HookPhase::BeforeUnmount).await
            }),
            step(self, |p, props| async move {
                let props = p.app_props(props, false);
                (p.instance.exports.unmount)(props)
                    .await
                    .map_err(|e| e.in_phase(&p.instance.app_name, "unmount"))
            }),
            step(self, |p, _| async move {
                match &p.instance.sandbox {
                    Some(sandbox) => sandbox.unmount().await,
                    None => Ok(()),
                }
            }),
            step(self, |p, _| async move {
                p.instance.run_phase(HookPhase::AfterUnmount).await
            }),
            step(self, |p, _| async move {
                p.renderer.render(None, RenderPhase::Unmounted)?;
                p.instance.state.off_global_state_change();
                p.release_element();
                p.instance
                    .bus
                    .publish(p.instance.event(EventKind::AppUnmounted));
                Ok(())
            }),
            step(self, |p, _| async move {
                if p.instance.singular {
                    p.instance.barrier.release();
                }
                Ok(())
            }),
        ]
    }

    fn update(self: &Arc<Self>) -> Option<LifecycleFn> {
        self.instance.exports.update.as_ref()?;
        Some(step(self, |p, props| async move {
            let props = p.app_props(props, true);
            match &p.instance.exports.update {
                Some(update) => update(props)
                    .await
                    .map_err(|e| e.in_phase(&p.instance.app_name, "update")),
                None => Ok(()),
            }
        }))
    }
}
