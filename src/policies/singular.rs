//! # Singular mode.
//!
//! [`SingularMode`] decides whether an app takes part in the process-wide singular
//! barrier, i.e. whether its mount must wait for the previously mounted singular app
//! to finish unmounting.
//!
//! ```text
//! SingularMode::Bool(true)            → every app serializes
//! SingularMode::Bool(false)           → no serialization (manual loading default)
//! SingularMode::Predicate(f)          → f(&app) evaluated once, at load time
//! ```

use std::fmt;
use std::sync::Arc;

use crate::apps::LoadableApp;

/// Policy selecting which apps are serialized by the singular barrier.
#[derive(Clone)]
pub enum SingularMode {
    Bool(bool),
    Predicate(Arc<dyn Fn(&LoadableApp) -> bool + Send + Sync>),
}

impl SingularMode {
    /// Builds a predicate-based mode.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&LoadableApp) -> bool + Send + Sync + 'static,
    {
        SingularMode::Predicate(Arc::new(f))
    }

    /// Whether `app` is serialized.
    pub fn applies(&self, app: &LoadableApp) -> bool {
        match self {
            SingularMode::Bool(on) => *on,
            SingularMode::Predicate(f) => f(app),
        }
    }
}

impl Default for SingularMode {
    /// Returns `SingularMode::Bool(true)`.
    fn default() -> Self {
        SingularMode::Bool(true)
    }
}

impl From<bool> for SingularMode {
    fn from(on: bool) -> Self {
        SingularMode::Bool(on)
    }
}

impl fmt::Debug for SingularMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingularMode::Bool(on) => write!(f, "Bool({on})"),
            SingularMode::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
