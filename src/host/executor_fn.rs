//! # Function-backed script executor (`ExecutorFn`)
//!
//! [`ExecutorFn`] wraps a closure `F: Fn(ExecutionContext, bool) -> Fut`, producing a
//! fresh future per evaluation. Shared state between evaluations must be captured
//! explicitly (e.g. an `Arc<AtomicUsize>` counting executions).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use microvisor::{lifecycle_fn, ExecutorFn, ModuleExports, ScriptExecutor};
//!
//! let exec: Arc<dyn ScriptExecutor> = ExecutorFn::arc(|global, _strict| async move {
//!     // scripts may also publish their exports as a global
//!     global.set_data("__ready__", true);
//!     Ok(ModuleExports::new().with_mount(lifecycle_fn(|_| async { Ok(()) })))
//! });
//! # let _ = exec;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::apps::ModuleExports;
use crate::error::FrameworkError;
use crate::host::{ExecutionContext, ScriptExecutor};

/// Function-backed executor.
#[derive(Debug)]
pub struct ExecutorFn<F> {
    f: F,
}

impl<F, Fut> ExecutorFn<F>
where
    F: Fn(ExecutionContext, bool) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ModuleExports, FrameworkError>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the executor as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> ScriptExecutor for ExecutorFn<F>
where
    F: Fn(ExecutionContext, bool) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ModuleExports, FrameworkError>> + Send + 'static,
{
    async fn execute(
        &self,
        global: &ExecutionContext,
        strict: bool,
    ) -> Result<ModuleExports, FrameworkError> {
        (self.f)(global.clone(), strict).await
    }
}
