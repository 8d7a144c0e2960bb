//! # Lifecycle function shapes and host hook sets.
//!
//! Two kinds of async callbacks travel through the runtime:
//!
//! - [`LifecycleFn`]: what an app exports (`bootstrap`, `mount`, `unmount`, `update`) and
//!   what a parcel hook chain is made of ([`Hook`]). Receives [`LifecycleProps`].
//! - [`LifecycleHook`]: host-side hooks (`before_load`, `before_mount`, ...). Receives a
//!   [`HookContext`] describing the instance.
//!
//! ## Merge rule
//! [`FrameworkLifecycles::merge`] concatenates per phase, left operand first. The
//! orchestrator merges built-in add-ons, then caller hooks:
//! ```text
//! add-ons.before_mount ++ caller.before_mount  ──► executed left to right
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::error::FrameworkError;
use crate::host::{Element, ExecutionContext};
use crate::state::{MicroAppStateActions, StateMap};

/// Boxed future returned by every lifecycle callback.
pub type BoxResultFuture = BoxFuture<'static, Result<(), FrameworkError>>;

/// Async function receiving [`LifecycleProps`].
pub type LifecycleFn = Arc<dyn Fn(LifecycleProps) -> BoxResultFuture + Send + Sync>;

/// One step of a parcel mount/unmount chain.
pub type Hook = LifecycleFn;

/// Async host hook receiving a [`HookContext`].
pub type LifecycleHook = Arc<dyn Fn(HookContext) -> BoxResultFuture + Send + Sync>;

/// Wraps an async closure into a [`LifecycleFn`].
///
/// # Example
/// ```
/// use microvisor::{lifecycle_fn, LifecycleFn, LifecycleProps};
///
/// let mount: LifecycleFn = lifecycle_fn(|props: LifecycleProps| async move {
///     let _ = props.container;
///     Ok(())
/// });
/// # let _ = mount;
/// ```
pub fn lifecycle_fn<F, Fut>(f: F) -> LifecycleFn
where
    F: Fn(LifecycleProps) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), FrameworkError>> + Send + 'static,
{
    Arc::new(move |props| Box::pin(f(props)))
}

/// Wraps an async closure into a [`LifecycleHook`].
pub fn lifecycle_hook<F, Fut>(f: F) -> LifecycleHook
where
    F: Fn(HookContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), FrameworkError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Props handed to lifecycle functions.
///
/// The orchestrator extends the scheduler's props with the wrapper element
/// (`container`) and, for `mount`, the instance's global-state actions.
#[derive(Clone)]
pub struct LifecycleProps {
    /// App name.
    pub name: String,
    /// Caller-supplied custom props.
    pub props: Value,
    /// Wrapper element the app renders into.
    pub container: Option<Element>,
    /// Global state actions bound to this instance.
    pub state: Option<MicroAppStateActions>,
}

impl LifecycleProps {
    pub fn new(name: impl Into<String>, props: Value) -> Self {
        Self {
            name: name.into(),
            props,
            container: None,
            state: None,
        }
    }

    /// Forwards to the bound state actions; `false` when none are attached.
    pub fn set_global_state(&self, partial: StateMap) -> bool {
        self.state
            .as_ref()
            .map(|s| s.set_global_state(partial))
            .unwrap_or(false)
    }

    /// Forwards to the bound state actions; no-op when none are attached.
    pub fn on_global_state_change<F>(&self, callback: F, fire_immediately: bool)
    where
        F: Fn(&StateMap, &StateMap) + Send + Sync + 'static,
    {
        if let Some(s) = &self.state {
            s.on_global_state_change(callback, fire_immediately);
        }
    }
}

impl Default for LifecycleProps {
    fn default() -> Self {
        Self::new(String::new(), Value::Object(Map::new()))
    }
}

impl fmt::Debug for LifecycleProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleProps")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("container", &self.container)
            .field("state", &self.state.as_ref().map(|s| s.id().to_string()))
            .finish()
    }
}

/// Duck-typed export object produced by script execution. Any field may be missing.
#[derive(Clone, Default)]
pub struct ModuleExports {
    pub bootstrap: Option<LifecycleFn>,
    pub mount: Option<LifecycleFn>,
    pub unmount: Option<LifecycleFn>,
    pub update: Option<LifecycleFn>,
}

impl ModuleExports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bootstrap(mut self, f: LifecycleFn) -> Self {
        self.bootstrap = Some(f);
        self
    }

    pub fn with_mount(mut self, f: LifecycleFn) -> Self {
        self.mount = Some(f);
        self
    }

    pub fn with_unmount(mut self, f: LifecycleFn) -> Self {
        self.unmount = Some(f);
        self
    }

    pub fn with_update(mut self, f: LifecycleFn) -> Self {
        self.update = Some(f);
        self
    }

    /// Returns the validated set when `bootstrap`, `mount` and `unmount` are all present.
    pub fn validate(&self) -> Option<LifecycleExports> {
        Some(LifecycleExports {
            bootstrap: self.bootstrap.clone()?,
            mount: self.mount.clone()?,
            unmount: self.unmount.clone()?,
            update: self.update.clone(),
        })
    }
}

impl fmt::Debug for ModuleExports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleExports")
            .field("bootstrap", &self.bootstrap.is_some())
            .field("mount", &self.mount.is_some())
            .field("unmount", &self.unmount.is_some())
            .field("update", &self.update.is_some())
            .finish()
    }
}

/// Validated lifecycle functions of one app.
#[derive(Clone)]
pub struct LifecycleExports {
    pub bootstrap: LifecycleFn,
    pub mount: LifecycleFn,
    pub unmount: LifecycleFn,
    pub update: Option<LifecycleFn>,
}

/// Context handed to host hooks.
#[derive(Clone, Debug)]
pub struct HookContext {
    /// App name.
    pub app_name: Arc<str>,
    /// Instance id.
    pub instance_id: Arc<str>,
    /// Execution context the app runs against (sandbox proxy or host global).
    pub global: ExecutionContext,
    /// Caller-supplied custom props.
    pub props: Value,
}

/// Named phases of host hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookPhase {
    BeforeLoad,
    BeforeMount,
    AfterMount,
    BeforeUnmount,
    AfterUnmount,
}

impl HookPhase {
    pub const ALL: [HookPhase; 5] = [
        HookPhase::BeforeLoad,
        HookPhase::BeforeMount,
        HookPhase::AfterMount,
        HookPhase::BeforeUnmount,
        HookPhase::AfterUnmount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::BeforeLoad => "before_load",
            HookPhase::BeforeMount => "before_mount",
            HookPhase::AfterMount => "after_mount",
            HookPhase::BeforeUnmount => "before_unmount",
            HookPhase::AfterUnmount => "after_unmount",
        }
    }
}

/// Host hooks grouped by phase.
#[derive(Clone, Default)]
pub struct FrameworkLifecycles {
    before_load: Vec<LifecycleHook>,
    before_mount: Vec<LifecycleHook>,
    after_mount: Vec<LifecycleHook>,
    before_unmount: Vec<LifecycleHook>,
    after_unmount: Vec<LifecycleHook>,
}

impl FrameworkLifecycles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook to `phase`.
    pub fn on(mut self, phase: HookPhase, hook: LifecycleHook) -> Self {
        self.slot_mut(phase).push(hook);
        self
    }

    pub fn hooks(&self, phase: HookPhase) -> &[LifecycleHook] {
        match phase {
            HookPhase::BeforeLoad => &self.before_load,
            HookPhase::BeforeMount => &self.before_mount,
            HookPhase::AfterMount => &self.after_mount,
            HookPhase::BeforeUnmount => &self.before_unmount,
            HookPhase::AfterUnmount => &self.after_unmount,
        }
    }

    fn slot_mut(&mut self, phase: HookPhase) -> &mut Vec<LifecycleHook> {
        match phase {
            HookPhase::BeforeLoad => &mut self.before_load,
            HookPhase::BeforeMount => &mut self.before_mount,
            HookPhase::AfterMount => &mut self.after_mount,
            HookPhase::BeforeUnmount => &mut self.before_unmount,
            HookPhase::AfterUnmount => &mut self.after_unmount,
        }
    }

    /// Concatenates `other` after `self`, phase by phase.
    #[must_use]
    pub fn merge(mut self, other: &FrameworkLifecycles) -> Self {
        for phase in HookPhase::ALL {
            let extra = other.hooks(phase).to_vec();
            self.slot_mut(phase).extend(extra);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        HookPhase::ALL.iter().all(|p| self.hooks(*p).is_empty())
    }
}

impl fmt::Debug for FrameworkLifecycles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("FrameworkLifecycles");
        for phase in HookPhase::ALL {
            d.field(phase.as_str(), &self.hooks(phase).len());
        }
        d.finish()
    }
}

/// Render phases of the wrapper element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    Loading,
    Mounting,
    Mounted,
    Unmounted,
}

impl RenderPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderPhase::Loading => "loading",
            RenderPhase::Mounting => "mounting",
            RenderPhase::Mounted => "mounted",
            RenderPhase::Unmounted => "unmounted",
        }
    }
}
