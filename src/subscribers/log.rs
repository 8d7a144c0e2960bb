//! # LogWriter: event renderer over `tracing`
//!
//! A minimal subscriber that renders incoming [`Event`]s as `tracing` records.
//! Lifecycle progress goes to `info`/`debug`, diagnostics to `warn`, failures to `error`.
//! Install any `tracing` subscriber in the host to see the output.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO microvisor: app loaded app="react" instance="react_1700000000000_k2j9aa" elapsed_ms=12
//! INFO microvisor: app mounted app="react" instance="react_1700000000000_k2j9aa" elapsed_ms=3
//! WARN microvisor: state key rejected instance="vue_1700000000001_0pqa1c" key="user"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let app = e.app.as_deref().unwrap_or("-");
        let instance = e.instance.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::FrameworkStarted => tracing::info!("framework started"),
            EventKind::FirstAppMounted => tracing::info!(app, "first app mounted"),
            EventKind::AppRegistered => tracing::debug!(app, "app registered"),
            EventKind::DuplicateRegistration => {
                tracing::warn!(app, "app already registered, ignoring")
            }
            EventKind::RemountCacheHit => tracing::debug!(app, key = reason, "remount cache hit"),
            EventKind::PrefetchFailed => tracing::warn!(app, err = reason, "prefetch failed"),
            EventKind::AppLoading => tracing::debug!(app, "app loading"),
            EventKind::AppLoaded => {
                tracing::info!(app, instance, elapsed_ms = ?e.elapsed_ms, "app loaded")
            }
            EventKind::AppLoadFailed => tracing::error!(app, err = reason, "app load failed"),
            EventKind::AppMounting => tracing::debug!(app, instance, "app mounting"),
            EventKind::AppMounted => {
                tracing::info!(app, instance, elapsed_ms = ?e.elapsed_ms, "app mounted")
            }
            EventKind::AppUnmounting => tracing::debug!(app, instance, "app unmounting"),
            EventKind::AppUnmounted => tracing::info!(app, instance, "app unmounted"),
            EventKind::AppBroken => tracing::error!(app, err = reason, "app broken"),
            EventKind::SandboxDegraded => {
                tracing::warn!(app, missing = reason, "sandbox degraded")
            }
            EventKind::StateUnchanged => tracing::warn!(instance, "state has not changed"),
            EventKind::StateKeyRejected => tracing::warn!(
                instance,
                key = e.key.as_deref().unwrap_or("-"),
                "state key not declared at init, skipped"
            ),
            EventKind::StateListenerOverwritten => {
                tracing::warn!(instance, "global listener already existed, overwritten")
            }
            EventKind::StateChanged => tracing::debug!(instance, keys = reason, "state changed"),
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = app, reason, "subscriber dropped event")
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(subscriber = app, info = reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn renders_events_with_levels() {
        let out = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info"))
            .with_writer(out.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let w = LogWriter::new();
        w.on_event(&Event::new(EventKind::AppMounted).with_app("react").with_instance("react_1"))
            .await;
        w.on_event(&Event::new(EventKind::AppLoading).with_app("react")).await;
        w.on_event(&Event::new(EventKind::PrefetchFailed).with_app("vue").with_reason("404"))
            .await;

        let text = String::from_utf8(out.0.lock().clone()).unwrap();
        assert!(text.contains("INFO"));
        assert!(text.contains("app mounted"));
        assert!(text.contains("WARN"));
        assert!(text.contains("prefetch failed"));
        assert!(!text.contains("app loading"));
    }
}
