//! # Prefetch strategies.
//!
//! [`PrefetchStrategy`] decides which registered apps get their entries warmed up,
//! and when:
//!
//! ```text
//! Disabled            → nothing
//! AfterFirstMounted   → every not-yet-loaded app, once the first app mounted (default)
//! All                 → every registered app, immediately at start
//! Named(names)        → the named apps, once the first app mounted
//! Custom(f)           → f(apps) = (critical, minor): critical now, minor after first mount
//! ```

use std::fmt;
use std::sync::Arc;

use crate::apps::RegistrableApp;

/// Splits registered apps into `(critical, minor)` name lists.
pub type PrefetchSplit = Arc<dyn Fn(&[RegistrableApp]) -> (Vec<String>, Vec<String>) + Send + Sync>;

/// When and what to prefetch.
#[derive(Clone, Default)]
pub enum PrefetchStrategy {
    Disabled,
    #[default]
    AfterFirstMounted,
    All,
    Named(Vec<String>),
    Custom(PrefetchSplit),
}

impl PrefetchStrategy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[RegistrableApp]) -> (Vec<String>, Vec<String>) + Send + Sync + 'static,
    {
        PrefetchStrategy::Custom(Arc::new(f))
    }

    /// Resolves the strategy to `(immediate, after_first_mounted)` name lists.
    pub fn plan(&self, apps: &[RegistrableApp]) -> (Vec<String>, Vec<String>) {
        let names = || apps.iter().map(|a| a.name().to_string()).collect::<Vec<_>>();
        match self {
            PrefetchStrategy::Disabled => (Vec::new(), Vec::new()),
            PrefetchStrategy::AfterFirstMounted => (Vec::new(), names()),
            PrefetchStrategy::All => (names(), Vec::new()),
            PrefetchStrategy::Named(list) => (Vec::new(), list.clone()),
            PrefetchStrategy::Custom(split) => split(apps),
        }
    }
}

impl From<bool> for PrefetchStrategy {
    fn from(on: bool) -> Self {
        if on {
            PrefetchStrategy::AfterFirstMounted
        } else {
            PrefetchStrategy::Disabled
        }
    }
}

impl fmt::Debug for PrefetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefetchStrategy::Disabled => f.write_str("Disabled"),
            PrefetchStrategy::AfterFirstMounted => f.write_str("AfterFirstMounted"),
            PrefetchStrategy::All => f.write_str("All"),
            PrefetchStrategy::Named(names) => f.debug_tuple("Named").field(names).finish(),
            PrefetchStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
