//! Test doubles shared by in-crate tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::apps::{Entry, LifecycleFn, LifecycleProps, ModuleExports, lifecycle_fn};
use crate::error::FrameworkError;
use crate::events::Event;
use crate::host::{
    Document, Element, EntryLoader, ExecutionContext, FetchOptions, ImportedEntry,
    ScriptExecutor,
};

pub(crate) type Log = Arc<Mutex<Vec<String>>>;

pub(crate) fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// Position of `needle` in the log; panics when absent.
pub(crate) fn pos(log: &Log, needle: &str) -> usize {
    log.lock()
        .iter()
        .position(|l| l == needle)
        .unwrap_or_else(|| panic!("{needle} not in {:?}", log.lock()))
}

/// Every position of `needle` in the log, in order.
pub(crate) fn positions(log: &Log, needle: &str) -> Vec<usize> {
    log.lock()
        .iter()
        .enumerate()
        .filter(|(_, l)| l.as_str() == needle)
        .map(|(i, _)| i)
        .collect()
}

/// Where a fake app leaves its lifecycle functions.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ExportStyle {
    Module,
    LatestGlobal,
    NamedGlobal,
    Missing,
}

#[derive(Default, Debug)]
pub(crate) struct Counters {
    pub executions: AtomicUsize,
    pub bootstrap: AtomicUsize,
    pub mount: AtomicUsize,
    pub unmount: AtomicUsize,
    pub update: AtomicUsize,
}

impl Counters {
    pub(crate) fn get(&self, which: &str) -> usize {
        let c = match which {
            "executions" => &self.executions,
            "bootstrap" => &self.bootstrap,
            "mount" => &self.mount,
            "unmount" => &self.unmount,
            _ => &self.update,
        };
        c.load(Ordering::SeqCst)
    }
}

/// Scripted micro-app.
#[derive(Clone)]
pub(crate) struct FakeApp {
    pub name: String,
    pub style: ExportStyle,
    pub bootstrap_delay: Duration,
    pub unmount_delay: Duration,
    pub counters: Arc<Counters>,
    pub log: Log,
    pub last_props: Arc<Mutex<Option<LifecycleProps>>>,
}

impl FakeApp {
    pub(crate) fn new(name: &str, log: &Log) -> Self {
        Self {
            name: name.to_string(),
            style: ExportStyle::Module,
            bootstrap_delay: Duration::ZERO,
            unmount_delay: Duration::ZERO,
            counters: Arc::new(Counters::default()),
            log: Arc::clone(log),
            last_props: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn with_style(mut self, style: ExportStyle) -> Self {
        self.style = style;
        self
    }

    pub(crate) fn with_bootstrap_delay(mut self, d: Duration) -> Self {
        self.bootstrap_delay = d;
        self
    }

    pub(crate) fn with_unmount_delay(mut self, d: Duration) -> Self {
        self.unmount_delay = d;
        self
    }

    pub(crate) fn entry(&self) -> String {
        format!("//{}", self.name)
    }

    /// Container the app last received.
    pub(crate) fn last_container(&self) -> Option<Element> {
        self.last_props.lock().as_ref().and_then(|p| p.container.clone())
    }

    fn step(&self, phase: &'static str, delay: Duration) -> LifecycleFn {
        let app = self.clone();
        lifecycle_fn(move |props: LifecycleProps| {
            let app = app.clone();
            async move {
                let counter = match phase {
                    "bootstrap" => &app.counters.bootstrap,
                    "mount" => &app.counters.mount,
                    "unmount" => &app.counters.unmount,
                    _ => &app.counters.update,
                };
                counter.fetch_add(1, Ordering::SeqCst);
                app.log.lock().push(format!("{}:{phase}:start", app.name));
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                *app.last_props.lock() = Some(props);
                app.log.lock().push(format!("{}:{phase}:end", app.name));
                Ok(())
            }
        })
    }

    pub(crate) fn exports(&self) -> ModuleExports {
        ModuleExports::new()
            .with_bootstrap(self.step("bootstrap", self.bootstrap_delay))
            .with_mount(self.step("mount", Duration::ZERO))
            .with_unmount(self.step("unmount", self.unmount_delay))
            .with_update(self.step("update", Duration::ZERO))
    }
}

struct FakeExecutor {
    app: FakeApp,
}

#[async_trait]
impl ScriptExecutor for FakeExecutor {
    async fn execute(
        &self,
        global: &ExecutionContext,
        strict: bool,
    ) -> Result<ModuleExports, FrameworkError> {
        self.app.counters.executions.fetch_add(1, Ordering::SeqCst);
        self.app
            .log
            .lock()
            .push(format!("{}:exec:strict={strict}", self.app.name));
        match self.app.style {
            ExportStyle::Module => Ok(self.app.exports()),
            ExportStyle::LatestGlobal => {
                global.set_exports(format!("{}Lib", self.app.name), self.app.exports());
                Ok(ModuleExports::new())
            }
            ExportStyle::NamedGlobal => {
                global.set_exports(self.app.name.as_str(), self.app.exports());
                global.set_data("unrelated", 1);
                Ok(ModuleExports::new())
            }
            ExportStyle::Missing => Ok(ModuleExports::new()),
        }
    }
}

/// Entry loader serving [`FakeApp`]s by their `//name` entry.
#[derive(Default)]
pub(crate) struct FakeLoader {
    apps: Mutex<HashMap<String, FakeApp>>,
    pub loads: AtomicUsize,
    pub prefetched: Mutex<Vec<String>>,
}

impl FakeLoader {
    pub(crate) fn new(apps: impl IntoIterator<Item = FakeApp>) -> Arc<Self> {
        let loader = Self::default();
        for app in apps {
            loader.apps.lock().insert(app.entry(), app);
        }
        Arc::new(loader)
    }

    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn find(&self, entry: &Entry) -> Result<FakeApp, FrameworkError> {
        let Entry::Url(url) = entry else {
            return Err(FrameworkError::hook("manifest entries unsupported"));
        };
        self.apps
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| FrameworkError::hook(format!("404 {url}")))
    }
}

#[async_trait]
impl EntryLoader for FakeLoader {
    async fn load(
        &self,
        entry: &Entry,
        _fetch: &FetchOptions,
    ) -> Result<ImportedEntry, FrameworkError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let app = self.find(entry)?;
        Ok(ImportedEntry {
            template: format!(
                "<head><style>.title{{color:red}}</style></head><section>{}</section>",
                app.name
            ),
            executor: Arc::new(FakeExecutor { app: app.clone() }),
            asset_public_path: format!("//cdn/{}/", app.name),
        })
    }

    async fn prefetch(&self, entry: &Entry, _fetch: &FetchOptions) -> Result<(), FrameworkError> {
        self.prefetched.lock().push(entry.to_string());
        self.find(entry).map(|_| ())
    }
}

/// Document with two empty containers, `#c1` and `#c2`.
pub(crate) fn document() -> Document {
    let doc = Document::new();
    doc.body().append_child(&Element::new("div").with_id("c1"));
    doc.body().append_child(&Element::new("div").with_id("c2"));
    doc
}

/// Drains every event currently buffered in `rx`.
pub(crate) fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}
