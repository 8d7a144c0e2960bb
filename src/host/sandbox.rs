//! # Isolation containers.
//!
//! A [`Sandbox`] gives one app instance a private execution context. The runtime only
//! needs four things from it: `mount`, `unmount`, the context scripts run against and
//! the most recently assigned global. How properties are trapped is the
//! implementation's business.
//!
//! Shipped implementations:
//! - [`NoopSandboxFactory`]: passthrough to the host's global context; loose mode only.
//! - [`RealmSandboxFactory`]: a fresh context per instance, strict mode capable.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::FrameworkError;
use crate::host::{Element, ExecutionContext};

/// Returns the instance's current wrapper element (replaced on every remount).
pub type ElementGetter = Arc<dyn Fn() -> Option<Element> + Send + Sync>;

/// Returns `true` for asset URLs the sandbox must not intercept.
pub type AssetFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Isolation container of one app instance.
#[async_trait]
pub trait Sandbox: Send + Sync + 'static {
    /// Activates isolation before the app mounts.
    async fn mount(&self) -> Result<(), FrameworkError>;

    /// Deactivates isolation after the app unmounted.
    async fn unmount(&self) -> Result<(), FrameworkError>;

    /// Context the app's scripts run against.
    fn execution_context(&self) -> ExecutionContext;

    /// Name of the global most recently assigned inside the sandbox.
    fn latest_set_prop(&self) -> Option<String> {
        self.execution_context().latest_set_prop()
    }

    /// Whether the sandbox is currently mounted.
    fn is_active(&self) -> bool;
}

/// Parameters of [`SandboxFactory::create`].
#[derive(Clone)]
pub struct SandboxOptions {
    pub app_name: String,
    pub element_getter: ElementGetter,
    /// Scoped stylesheet rewriting requested.
    pub scoped_css: bool,
    /// Loose (non-strict) isolation.
    pub loose: bool,
    pub exclude_asset_filter: Option<AssetFilter>,
}

impl fmt::Debug for SandboxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandboxOptions")
            .field("app_name", &self.app_name)
            .field("scoped_css", &self.scoped_css)
            .field("loose", &self.loose)
            .field("exclude_asset_filter", &self.exclude_asset_filter.is_some())
            .finish()
    }
}

/// Creates sandboxes for app instances.
pub trait SandboxFactory: Send + Sync + 'static {
    /// Whether strict (non-loose) isolation is available. When not, the runtime
    /// degrades to loose mode and reports it.
    fn supports_strict(&self) -> bool {
        true
    }

    fn create(&self, opts: SandboxOptions) -> Result<Arc<dyn Sandbox>, FrameworkError>;
}

/// Passthrough sandbox: scripts run against the host's own context.
pub struct NoopSandbox {
    global: ExecutionContext,
    active: AtomicBool,
}

#[async_trait]
impl Sandbox for NoopSandbox {
    async fn mount(&self) -> Result<(), FrameworkError> {
        self.active.store(true, Ordering::Release);
        Ok(())
    }

    async fn unmount(&self) -> Result<(), FrameworkError> {
        self.active.store(false, Ordering::Release);
        Ok(())
    }

    fn execution_context(&self) -> ExecutionContext {
        self.global.clone()
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Factory for [`NoopSandbox`]es sharing one host context.
#[derive(Clone, Debug, Default)]
pub struct NoopSandboxFactory {
    global: ExecutionContext,
}

impl NoopSandboxFactory {
    pub fn new(global: ExecutionContext) -> Self {
        Self { global }
    }
}

impl SandboxFactory for NoopSandboxFactory {
    fn supports_strict(&self) -> bool {
        false
    }

    fn create(&self, _opts: SandboxOptions) -> Result<Arc<dyn Sandbox>, FrameworkError> {
        Ok(Arc::new(NoopSandbox {
            global: self.global.clone(),
            active: AtomicBool::new(false),
        }))
    }
}

/// Sandbox with a private context per instance.
pub struct RealmSandbox {
    app_name: String,
    realm: ExecutionContext,
    active: AtomicBool,
}

impl RealmSandbox {
    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}

#[async_trait]
impl Sandbox for RealmSandbox {
    async fn mount(&self) -> Result<(), FrameworkError> {
        if self.active.swap(true, Ordering::AcqRel) {
            return Err(FrameworkError::Sandbox {
                app: self.app_name.clone(),
                error: "sandbox already active".into(),
            });
        }
        Ok(())
    }

    async fn unmount(&self) -> Result<(), FrameworkError> {
        self.active.store(false, Ordering::Release);
        Ok(())
    }

    fn execution_context(&self) -> ExecutionContext {
        self.realm.clone()
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Factory for [`RealmSandbox`]es.
#[derive(Clone, Copy, Debug, Default)]
pub struct RealmSandboxFactory;

impl SandboxFactory for RealmSandboxFactory {
    fn create(&self, opts: SandboxOptions) -> Result<Arc<dyn Sandbox>, FrameworkError> {
        Ok(Arc::new(RealmSandbox {
            app_name: opts.app_name,
            realm: ExecutionContext::new(),
            active: AtomicBool::new(false),
        }))
    }
}
