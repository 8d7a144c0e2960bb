//! Load policies.
//!
//! This module groups the knobs that control **how** an app is loaded and **which**
//! apps are warmed up ahead of time.
//!
//! ## Contents
//! - [`SingularMode`] whether an app is serialized by the singular barrier
//! - [`SandboxConfig`] isolation and style-isolation settings
//! - [`PrefetchStrategy`] which entries are prefetched, and when
//!
//! ## Quick wiring
//! ```text
//! LoadConfig { singular: SingularMode, sandbox: SandboxConfig, .. }
//!      └─► core::orchestrator::Orchestrator uses:
//!           - singular.applies(&app) once per load to join the barrier
//!           - sandbox to build the wrapper and create the isolation container
//! StartOptions { prefetch: PrefetchStrategy, .. }
//!      └─► core::prefetch spawns warmup tasks
//! ```
//!
//! ## Defaults
//! - `SingularMode::Bool(true)` for route-driven apps, `false` for manual loads.
//! - `SandboxConfig::enabled()` strict execution, no style isolation.
//! - `PrefetchStrategy::AfterFirstMounted`.

mod prefetch;
mod sandbox;
mod singular;

pub use prefetch::{PrefetchSplit, PrefetchStrategy};
pub use sandbox::SandboxConfig;
pub use singular::SingularMode;
