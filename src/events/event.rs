//! # Runtime events emitted by the framework, orchestrator and state bus.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: app instance flow (loading, mounting, mounted, unmounting, unmounted)
//! - **Management events**: registration, remount cache hits, framework start, prefetch
//! - **Diagnostic events**: global-state warnings and isolation downgrades
//! - **Subscriber events**: fan-out overflow and panics
//!
//! The [`Event`] struct carries additional metadata such as timestamps, app name,
//! instance id, state key, reasons and elapsed durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use microvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::AppMounted)
//!     .with_app("react")
//!     .with_instance("react_1700000000000_a1b2c3")
//!     .with_elapsed(Duration::from_millis(42));
//!
//! assert_eq!(ev.kind, EventKind::AppMounted);
//! assert_eq!(ev.app.as_deref(), Some("react"));
//! assert_eq!(ev.elapsed_ms, Some(42));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `app`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `app`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Framework events ===
    /// `Framework::start` completed; route-driven loaders are released.
    FrameworkStarted,

    /// The first app of the session finished mounting.
    ///
    /// Sets:
    /// - `app`: app name
    FirstAppMounted,

    /// App was accepted into the registry.
    ///
    /// Sets:
    /// - `app`: app name
    AppRegistered,

    /// App with an already registered name was ignored.
    ///
    /// Sets:
    /// - `app`: app name
    DuplicateRegistration,

    /// Manual load reused a cached, already evaluated instance.
    ///
    /// Sets:
    /// - `app`: app name
    /// - `reason`: cache key
    RemountCacheHit,

    /// Entry prefetch failed (non-fatal).
    ///
    /// Sets:
    /// - `app`: app name
    /// - `reason`: error message
    PrefetchFailed,

    // === App lifecycle events ===
    /// Entry fetch and script evaluation started.
    ///
    /// Sets:
    /// - `app`: app name
    AppLoading,

    /// Lifecycle exports resolved; the config getter is ready.
    ///
    /// Sets:
    /// - `app`: app name
    /// - `instance`: instance id
    /// - `elapsed_ms`: load duration
    AppLoaded,

    /// Loading failed.
    ///
    /// Sets:
    /// - `app`: app name
    /// - `reason`: error message
    AppLoadFailed,

    /// Mount hook chain started.
    ///
    /// Sets:
    /// - `app`: app name
    /// - `instance`: instance id
    AppMounting,

    /// Mount hook chain completed.
    ///
    /// Sets:
    /// - `app`: app name
    /// - `instance`: instance id
    /// - `elapsed_ms`: time since the matching `AppMounting`
    AppMounted,

    /// Unmount hook chain started.
    ///
    /// Sets:
    /// - `app`: app name
    /// - `instance`: instance id
    AppUnmounting,

    /// Unmount hook chain completed and the wrapper element was released.
    ///
    /// Sets:
    /// - `app`: app name
    /// - `instance`: instance id
    AppUnmounted,

    /// A lifecycle transition failed.
    ///
    /// Sets:
    /// - `app`: app name
    /// - `reason`: error message
    AppBroken,

    // === Diagnostics ===
    /// Isolation feature unavailable; a looser mode is used instead.
    ///
    /// Sets:
    /// - `app`: app name
    /// - `reason`: which capability was missing
    SandboxDegraded,

    /// Global state was set or re-seeded without any effective change.
    ///
    /// Sets:
    /// - `instance`: subscriber id of the writer
    StateUnchanged,

    /// Non-master writer tried to introduce an undeclared key.
    ///
    /// Sets:
    /// - `instance`: subscriber id of the writer
    /// - `key`: rejected key
    StateKeyRejected,

    /// A second `on_global_state_change` replaced an existing listener.
    ///
    /// Sets:
    /// - `instance`: subscriber id
    StateListenerOverwritten,

    /// Global state changed and listeners were notified.
    ///
    /// Sets:
    /// - `instance`: subscriber id of the writer
    /// - `reason`: comma separated changed keys
    StateChanged,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// App name, if applicable.
    pub app: Option<Arc<str>>,
    /// App instance id (also the state-bus subscriber id), if applicable.
    pub instance: Option<Arc<str>>,
    /// Global state key, if applicable.
    pub key: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Elapsed time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            app: None,
            instance: None,
            key: None,
            reason: None,
            elapsed_ms: None,
        }
    }

    /// Alias of [`Event::new`].
    #[inline]
    pub fn now(kind: EventKind) -> Self {
        Self::new(kind)
    }

    /// Attaches an app name.
    #[inline]
    pub fn with_app(mut self, app: impl Into<Arc<str>>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Attaches an instance id.
    #[inline]
    pub fn with_instance(mut self, instance: impl Into<Arc<str>>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Attaches a global state key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.elapsed_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_app(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_app(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// True for warnings that signal a degraded but non-fatal condition.
    #[inline]
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SandboxDegraded
                | EventKind::StateUnchanged
                | EventKind::StateKeyRejected
                | EventKind::StateListenerOverwritten
                | EventKind::DuplicateRegistration
                | EventKind::PrefetchFailed
        )
    }
}
