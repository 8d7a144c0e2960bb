//! Error types used by the microvisor runtime.
//!
//! [`FrameworkError`] covers three families of failures:
//!
//! - **configuration** errors (incompatible render/isolation options), raised at load time;
//! - **resolution** errors (mount container missing, lifecycle exports missing, entry or
//!   script failures), raised by the hook or load step that hit them;
//! - **lifecycle** errors returned by a micro-app's own `bootstrap`/`mount`/`unmount`/`update`.
//!
//! Consistency warnings (unchanged state, overwritten listener, undeclared key) are never
//! errors: they are published as [`Event`](crate::events::Event)s on the runtime bus.
//!
//! The enum is `Clone` so one failed in-flight load can be observed by every caller that
//! converged on it.

use thiserror::Error;

use crate::apps::RenderPhase;

/// # Errors produced by the microvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameworkError {
    /// A custom render function was combined with style isolation or scoped CSS.
    #[error(
        "app '{app}': custom render cannot be combined with strict style isolation or scoped css"
    )]
    IncompatibleRender {
        /// Name of the app being loaded.
        app: String,
    },

    /// Generic configuration problem detected before any lifecycle ran.
    #[error("invalid configuration for '{app}': {reason}")]
    InvalidConfig {
        /// Name of the app being loaded.
        app: String,
        /// What is wrong.
        reason: String,
    },

    /// The resolved mount container does not exist in the document.
    #[error("target container with {container} not existed {}", describe_phase(.app, *.phase))]
    ContainerNotFound {
        /// App instance id.
        app: String,
        /// Render phase that needed the container.
        phase: RenderPhase,
        /// Human-readable description of the requested container.
        container: String,
    },

    /// No strategy found a `bootstrap`/`mount`/`unmount` triple.
    #[error("you need to export lifecycle functions in {app} entry")]
    LifecycleNotExported {
        /// Name of the app.
        app: String,
    },

    /// The entry loader failed to fetch or parse an entry.
    #[error("failed to load entry for '{app}': {error}")]
    EntryLoad {
        /// Name of the app.
        app: String,
        /// Underlying error message.
        error: String,
    },

    /// Executing the app's scripts failed.
    #[error("failed to execute scripts of '{app}': {error}")]
    ScriptExecution {
        /// Name of the app.
        app: String,
        /// Underlying error message.
        error: String,
    },

    /// The isolation container could not be created or toggled.
    #[error("sandbox failure for '{app}': {error}")]
    Sandbox {
        /// Name of the app.
        app: String,
        /// Underlying error message.
        error: String,
    },

    /// A lifecycle function or hook returned an error.
    #[error("{phase} of '{app}' failed: {error}")]
    Lifecycle {
        /// Name of the app.
        app: String,
        /// Lifecycle phase (`bootstrap`, `mount`, `before_load`, ...).
        phase: &'static str,
        /// Underlying error message.
        error: String,
    },

    /// Error raised by user code inside a hook, before the runtime attached context.
    #[error("{error}")]
    Hook {
        /// Underlying error message.
        error: String,
    },

    /// The operation needs a parcel state it is not in (e.g. mounting a broken app).
    #[error("app '{app}' cannot {action} while {status}")]
    InvalidTransition {
        /// Name of the app.
        app: String,
        /// Requested action.
        action: &'static str,
        /// Current status label.
        status: &'static str,
    },
}

fn describe_phase(app: &str, phase: RenderPhase) -> String {
    match phase {
        RenderPhase::Loading | RenderPhase::Mounting => {
            format!("while {app} {}!", phase.as_str())
        }
        RenderPhase::Mounted => format!("after {app} {}!", phase.as_str()),
        RenderPhase::Unmounted => format!("while {app} rendering!"),
    }
}

impl FrameworkError {
    /// Shorthand for user hooks: wraps any message into [`FrameworkError::Hook`].
    ///
    /// # Example
    /// ```
    /// use microvisor::FrameworkError;
    ///
    /// let err = FrameworkError::hook("boom");
    /// assert_eq!(err.to_string(), "boom");
    /// ```
    pub fn hook(error: impl Into<String>) -> Self {
        FrameworkError::Hook {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use microvisor::FrameworkError;
    ///
    /// let err = FrameworkError::LifecycleNotExported { app: "react".into() };
    /// assert_eq!(err.as_label(), "lifecycle_not_exported");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FrameworkError::IncompatibleRender { .. } => "incompatible_render",
            FrameworkError::InvalidConfig { .. } => "invalid_config",
            FrameworkError::ContainerNotFound { .. } => "container_not_found",
            FrameworkError::LifecycleNotExported { .. } => "lifecycle_not_exported",
            FrameworkError::EntryLoad { .. } => "entry_load_failed",
            FrameworkError::ScriptExecution { .. } => "script_execution_failed",
            FrameworkError::Sandbox { .. } => "sandbox_failed",
            FrameworkError::Lifecycle { .. } => "lifecycle_failed",
            FrameworkError::Hook { .. } => "hook_failed",
            FrameworkError::InvalidTransition { .. } => "invalid_transition",
        }
    }

    /// Indicates a configuration error (raised at load time, before any fetch).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            FrameworkError::IncompatibleRender { .. } | FrameworkError::InvalidConfig { .. }
        )
    }

    /// Attaches app/phase context to a bare hook error; other variants pass through.
    pub(crate) fn in_phase(self, app: &str, phase: &'static str) -> Self {
        match self {
            FrameworkError::Hook { error } => FrameworkError::Lifecycle {
                app: app.to_string(),
                phase,
                error,
            },
            other => other,
        }
    }
}
