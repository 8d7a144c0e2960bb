//! # App descriptors and lifecycle contracts.
//!
//! This module provides the data types a host uses to describe micro-apps and the
//! function shapes that flow through hook chains:
//! - [`LoadableApp`] / [`RegistrableApp`] - manual and route-driven descriptors
//! - [`MountTarget`], [`Entry`] - where an app renders, where it is fetched from
//! - [`ModuleExports`] / [`LifecycleExports`] - what an app's scripts must provide
//! - [`FrameworkLifecycles`] - host hooks merged per phase
//! - [`LifecycleProps`] - what every lifecycle function receives

mod descriptor;
mod lifecycle;

pub use descriptor::{
    ActiveWhen, Entry, EntryManifest, LegacyRender, LegacyRenderProps, LoadableApp,
    LoadingIndicator, MountTarget, RegistrableApp,
};
pub use lifecycle::{
    BoxResultFuture, FrameworkLifecycles, Hook, HookContext, HookPhase, LifecycleExports,
    LifecycleFn, LifecycleHook, LifecycleProps, ModuleExports, RenderPhase, lifecycle_fn,
    lifecycle_hook,
};
