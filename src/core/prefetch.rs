//! # Entry prefetching.
//!
//! Warms up entries of registered apps through [`EntryLoader::prefetch`], following a
//! [`PrefetchStrategy`] plan:
//!
//! ```text
//! plan(apps) = (immediate, deferred)
//!   immediate ──► spawn prefetch now
//!   deferred  ──► wait first_mounted ──► skip apps already loaded ──► spawn prefetch
//! ```
//!
//! Prefetching is fire-and-forget: failures publish `PrefetchFailed` and nothing else.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::apps::{Entry, RegistrableApp};
use crate::events::{Bus, Event, EventKind};
use crate::host::{EntryLoader, FetchOptions};
use crate::policies::PrefetchStrategy;

/// Tells whether an app was already loaded (and needs no warm-up).
pub(crate) type LoadedProbe = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub(crate) struct Prefetcher {
    pub(crate) loader: Arc<dyn EntryLoader>,
    pub(crate) bus: Bus,
    pub(crate) fetch: FetchOptions,
}

impl Prefetcher {
    /// Launches the plan. Returned handles complete once every prefetch they own is done.
    pub(crate) fn run(
        &self,
        strategy: &PrefetchStrategy,
        apps: &[RegistrableApp],
        first_mounted: CancellationToken,
        is_loaded: LoadedProbe,
    ) -> Vec<JoinHandle<()>> {
        let (immediate, deferred) = strategy.plan(apps);
        let mut handles: Vec<JoinHandle<()>> = self
            .select(apps, &immediate)
            .into_iter()
            .map(|(name, entry)| self.spawn_one(name, entry))
            .collect();

        let later = self.select(apps, &deferred);
        if !later.is_empty() {
            let me = self.clone_parts();
            handles.push(tokio::spawn(async move {
                first_mounted.cancelled().await;
                let pending: Vec<JoinHandle<()>> = later
                    .into_iter()
                    .filter(|(name, _)| !is_loaded(name))
                    .map(|(name, entry)| me.spawn_one(name, entry))
                    .collect();
                for h in pending {
                    let _ = h.await;
                }
            }));
        }
        handles
    }

    /// Named apps that are registered, in plan order.
    fn select(&self, apps: &[RegistrableApp], names: &[String]) -> Vec<(String, Entry)> {
        names
            .iter()
            .filter_map(|n| {
                apps.iter()
                    .find(|a| a.name() == n)
                    .map(|a| (n.clone(), a.app.entry.clone()))
            })
            .collect()
    }

    fn spawn_one(&self, name: String, entry: Entry) -> JoinHandle<()> {
        let loader = Arc::clone(&self.loader);
        let bus = self.bus.clone();
        let fetch = self.fetch.clone();
        tokio::spawn(async move {
            if let Err(e) = loader.prefetch(&entry, &fetch).await {
                bus.publish(
                    Event::new(EventKind::PrefetchFailed)
                        .with_app(name.as_str())
                        .with_reason(e.to_string()),
                );
            }
        })
    }

    fn clone_parts(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            bus: self.bus.clone(),
            fetch: self.fetch.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakeApp, FakeLoader};

    fn setup() -> (Arc<FakeLoader>, Prefetcher, Vec<RegistrableApp>, Bus) {
        let log = testing::log();
        let react = FakeApp::new("react", &log);
        let vue = FakeApp::new("vue", &log);
        let loader = FakeLoader::new([react.clone(), vue.clone()]);
        let bus = Bus::new(16);
        let prefetcher = Prefetcher {
            loader: loader.clone(),
            bus: bus.clone(),
            fetch: FetchOptions::default(),
        };
        let apps = vec![
            RegistrableApp::new("react", react.entry(), |_| true),
            RegistrableApp::new("vue", vue.entry(), |_| true),
            RegistrableApp::new("ghost", "//ghost", |_| true),
        ];
        (loader, prefetcher, apps, bus)
    }

    async fn join(handles: Vec<JoinHandle<()>>) {
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn all_prefetches_immediately_and_reports_failures() {
        let (loader, prefetcher, apps, bus) = setup();
        let mut rx = bus.subscribe();

        let handles = prefetcher.run(
            &PrefetchStrategy::All,
            &apps,
            CancellationToken::new(),
            Arc::new(|_| false),
        );
        join(handles).await;

        let mut seen = loader.prefetched.lock().clone();
        seen.sort();
        assert_eq!(seen, vec!["//ghost", "//react", "//vue"]);

        let failed = rx.try_recv().unwrap();
        assert_eq!(failed.kind, EventKind::PrefetchFailed);
        assert_eq!(failed.app.as_deref(), Some("ghost"));
    }

    #[tokio::test]
    async fn deferred_prefetch_waits_for_first_mount_and_skips_loaded() {
        let (loader, prefetcher, apps, _bus) = setup();
        let first_mounted = CancellationToken::new();

        let handles = prefetcher.run(
            &PrefetchStrategy::Named(vec!["react".into(), "vue".into(), "unknown".into()]),
            &apps,
            first_mounted.clone(),
            Arc::new(|name| name == "react"),
        );
        tokio::task::yield_now().await;
        assert!(loader.prefetched.lock().is_empty());

        first_mounted.cancel();
        join(handles).await;
        assert_eq!(*loader.prefetched.lock(), vec!["//vue"]);
    }

    #[tokio::test]
    async fn custom_split_runs_critical_first() {
        let (loader, prefetcher, apps, _bus) = setup();
        let strategy = PrefetchStrategy::custom(|_| (vec!["vue".into()], vec!["react".into()]));

        let handles = prefetcher.run(&strategy, &apps, CancellationToken::new(), Arc::new(|_| false));
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(*loader.prefetched.lock(), vec!["//vue"]);
        drop(handles);
    }
}
