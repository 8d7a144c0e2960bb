//! # Entry loading and script execution.
//!
//! The runtime never fetches or parses anything itself. An [`EntryLoader`] turns an
//! [`Entry`] into an [`ImportedEntry`]: the HTML template, a [`ScriptExecutor`] that
//! evaluates the app's scripts against an [`ExecutionContext`], and the public path
//! assets are served from.
//!
//! ```text
//! EntryLoader::load(entry, fetch) ──► ImportedEntry { template, executor, asset_public_path }
//!                                                         │
//!                                   executor.execute(ctx, strict) ──► ModuleExports
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::apps::{Entry, ModuleExports};
use crate::error::FrameworkError;
use crate::host::ExecutionContext;

/// Options forwarded to the entry loader on every fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Extra request headers, in insertion order.
    pub headers: IndexMap<String, String>,
    /// Send cookies with cross-origin requests.
    pub with_credentials: bool,
}

impl FetchOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Evaluates an app's scripts inside an execution context.
///
/// Returns whatever the scripts exported as a module; the fallback discovery
/// strategies inspect the context afterwards.
#[async_trait]
pub trait ScriptExecutor: Send + Sync + 'static {
    async fn execute(
        &self,
        global: &ExecutionContext,
        strict: bool,
    ) -> Result<ModuleExports, FrameworkError>;
}

/// Result of loading one entry.
#[derive(Clone)]
pub struct ImportedEntry {
    /// HTML template, opaque to the runtime.
    pub template: String,
    /// Script evaluator for this entry.
    pub executor: Arc<dyn ScriptExecutor>,
    /// Public path of the entry's assets.
    pub asset_public_path: String,
}

impl fmt::Debug for ImportedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportedEntry")
            .field("template", &self.template.len())
            .field("asset_public_path", &self.asset_public_path)
            .finish()
    }
}

/// # Fetches entries.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use microvisor::{
///     Entry, EntryLoader, ExecutorFn, FetchOptions, FrameworkError, ImportedEntry, ModuleExports,
/// };
///
/// struct Inline;
///
/// #[async_trait]
/// impl EntryLoader for Inline {
///     async fn load(&self, entry: &Entry, _: &FetchOptions) -> Result<ImportedEntry, FrameworkError> {
///         Ok(ImportedEntry {
///             template: format!("<div>{entry}</div>"),
///             executor: ExecutorFn::arc(|_global, _strict| async { Ok(ModuleExports::new()) }),
///             asset_public_path: "/".into(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait EntryLoader: Send + Sync + 'static {
    /// Fetches the entry's template and scripts.
    async fn load(&self, entry: &Entry, fetch: &FetchOptions)
    -> Result<ImportedEntry, FrameworkError>;

    /// Warms caches for an entry without evaluating it. Defaults to a full load.
    async fn prefetch(&self, entry: &Entry, fetch: &FetchOptions) -> Result<(), FrameworkError> {
        self.load(entry, fetch).await.map(|_| ())
    }
}
