//! # Host collaborators.
//!
//! Everything the runtime needs from its environment, expressed as types and traits
//! the host plugs implementations into:
//! - [`Document`] / [`Element`]: in-memory document tree wrappers are attached to
//! - [`ExecutionContext`]: global property bag scripts run against
//! - [`EntryLoader`] / [`ScriptExecutor`]: fetching entries and evaluating scripts
//! - [`SandboxFactory`] / [`Sandbox`]: isolation containers
//! - [`styles`]: scoped stylesheet rewriting used by the wrapper builder

mod context;
mod dom;
mod entry;
mod executor_fn;
mod sandbox;
pub mod styles;

pub use context::{ExecutionContext, GlobalValue};
pub use dom::{Document, Element};
pub use entry::{EntryLoader, FetchOptions, ImportedEntry, ScriptExecutor};
pub use executor_fn::ExecutorFn;
pub use sandbox::{
    AssetFilter, ElementGetter, NoopSandbox, NoopSandboxFactory, RealmSandbox,
    RealmSandboxFactory, Sandbox, SandboxFactory, SandboxOptions,
};
