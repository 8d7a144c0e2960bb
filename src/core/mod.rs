//! Runtime core: orchestration and lifecycle.
//!
//! The public API from this module is [`Framework`] (with [`FrameworkBuilder`]),
//! the [`MicroApp`] parcel handle, the [`Scheduler`] seam and configuration types.
//!
//! Internal modules:
//! - [`orchestrator`]: loads one instance and assembles its mount/unmount hook chains;
//! - [`wrapper`]: wrapper element and render contract;
//! - [`exports`]: lifecycle export discovery strategies;
//! - [`addons`]: built-in host hooks merged ahead of caller hooks;
//! - [`parcel`]: state machine driving a parcel config;
//! - [`remount`]: remount cache and container bookkeeping for manual loads;
//! - [`scheduler`]: route-activation substrate;
//! - [`prefetch`]: entry warm-up;
//! - [`barrier`], [`deferred`]: one-shot completion primitives;
//! - [`registry`], [`mounted`]: registered apps and mounted-app tracking.

mod addons;
mod barrier;
mod builder;
mod config;
mod deferred;
mod exports;
mod framework;
mod hooks;
mod mounted;
mod orchestrator;
mod parcel;
mod prefetch;
mod registry;
mod remount;
mod scheduler;
mod wrapper;

pub use addons::{ENGINE_FLAG, PUBLIC_PATH_KEY};
pub use builder::FrameworkBuilder;
pub use config::{FrameworkConfig, LoadConfig, StartOptions};
pub use exports::{EXPORT_SOURCES, ExportSource};
pub use framework::Framework;
pub use mounted::MountedTracker;
pub use orchestrator::{ConfigGetter, ParcelConfig};
pub use parcel::{AppStatus, LoadFuture, MicroApp};
pub use scheduler::{ActivityScheduler, ScheduledApp, Scheduler};
pub use wrapper::{HEAD_TAG, wrapper_id};
