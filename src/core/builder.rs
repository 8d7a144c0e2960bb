use std::sync::Arc;

use crate::{
    core::{
        barrier::SingularBarrier, config::FrameworkConfig, framework::Framework,
        orchestrator::Orchestrator, scheduler::ActivityScheduler, scheduler::Scheduler,
    },
    events::Bus,
    host::{Document, EntryLoader, ExecutionContext, RealmSandboxFactory, SandboxFactory},
    state::GlobalState,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Framework`] with optional collaborators.
pub struct FrameworkBuilder {
    cfg: FrameworkConfig,
    entry_loader: Arc<dyn EntryLoader>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    sandbox_factory: Option<Arc<dyn SandboxFactory>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    document: Option<Document>,
    global: Option<ExecutionContext>,
}

impl FrameworkBuilder {
    /// Creates a new builder with the given configuration and entry loader.
    pub fn new(cfg: FrameworkConfig, entry_loader: Arc<dyn EntryLoader>) -> Self {
        Self {
            cfg,
            entry_loader,
            subscribers: Vec::new(),
            sandbox_factory: None,
            scheduler: None,
            document: None,
            global: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (app lifecycle, state diagnostics, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Isolation containers to create per instance. Defaults to [`RealmSandboxFactory`].
    pub fn with_sandbox_factory(mut self, factory: Arc<dyn SandboxFactory>) -> Self {
        self.sandbox_factory = Some(factory);
        self
    }

    /// Route-activation substrate. Defaults to an [`ActivityScheduler`] at `""`.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Document wrappers are attached to. Defaults to an empty one.
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Host global context used when the sandbox is disabled.
    pub fn with_global(mut self, global: ExecutionContext) -> Self {
        self.global = Some(global);
        self
    }

    /// Builds the framework.
    ///
    /// Spawns the event listener and subscriber workers, so it must be called
    /// inside a tokio runtime.
    pub fn build(self) -> Arc<Framework> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        let orchestrator = Orchestrator {
            bus: bus.clone(),
            document: self.document.unwrap_or_default(),
            global: self.global.unwrap_or_default(),
            entry_loader: self.entry_loader,
            sandbox_factory: self
                .sandbox_factory
                .unwrap_or_else(|| Arc::new(RealmSandboxFactory)),
            state: Arc::new(GlobalState::new(bus.clone())),
            barrier: Arc::new(SingularBarrier::new()),
        };
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(ActivityScheduler::new()));

        Framework::new_internal(self.cfg, bus, subs, orchestrator, scheduler)
    }
}
