//! # Framework configuration.
//!
//! Provides [`FrameworkConfig`] (runtime-wide settings), [`LoadConfig`] (per-load
//! settings) and [`StartOptions`] (what [`Framework::start`](crate::Framework::start)
//! receives).
//!
//! Config is used in three ways:
//! 1. **Framework creation**: `Framework::builder(config, loader)`
//! 2. **Route-driven loads**: the [`StartOptions::load`] stored by `start`
//! 3. **Manual loads**: explicit [`LoadConfig`], or the started one with `singular = false`
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1

use std::fmt;

use crate::host::{AssetFilter, FetchOptions};
use crate::policies::{PrefetchStrategy, SandboxConfig, SingularMode};

/// Runtime-wide configuration.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `load`: defaults used until `start` supplies its own
#[derive(Clone, Debug)]
pub struct FrameworkConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Load configuration in effect before `start` is called.
    pub load: LoadConfig,
}

impl FrameworkConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for FrameworkConfig {
    /// - `bus_capacity = 1024`
    /// - `load = LoadConfig::default()`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            load: LoadConfig::default(),
        }
    }
}

/// Settings of one load.
#[derive(Clone)]
pub struct LoadConfig {
    /// Which apps take part in the singular barrier.
    pub singular: SingularMode,
    /// Isolation settings.
    pub sandbox: SandboxConfig,
    /// Assets the sandbox must leave alone.
    pub exclude_asset_filter: Option<AssetFilter>,
    /// Options forwarded to the entry loader.
    pub fetch: FetchOptions,
    /// Manual loads: key the remount cache by name only instead of name + container position.
    pub cache_by_app_name: bool,
}

impl LoadConfig {
    /// Default settings for manual loads (`singular = false`).
    pub fn manual() -> Self {
        Self::default().with_singular(false)
    }

    pub fn with_singular(mut self, singular: impl Into<SingularMode>) -> Self {
        self.singular = singular.into();
        self
    }

    pub fn with_sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_fetch(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_exclude_asset_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.exclude_asset_filter = Some(std::sync::Arc::new(filter));
        self
    }

    pub fn with_cache_by_app_name(mut self, on: bool) -> Self {
        self.cache_by_app_name = on;
        self
    }
}

impl Default for LoadConfig {
    /// - `singular = Bool(true)`
    /// - `sandbox = SandboxConfig::enabled()`
    /// - no asset filter, default fetch options, cache keyed by container position
    fn default() -> Self {
        Self {
            singular: SingularMode::default(),
            sandbox: SandboxConfig::default(),
            exclude_asset_filter: None,
            fetch: FetchOptions::default(),
            cache_by_app_name: false,
        }
    }
}

impl fmt::Debug for LoadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadConfig")
            .field("singular", &self.singular)
            .field("sandbox", &self.sandbox)
            .field("exclude_asset_filter", &self.exclude_asset_filter.is_some())
            .field("fetch", &self.fetch)
            .field("cache_by_app_name", &self.cache_by_app_name)
            .finish()
    }
}

/// Options of [`Framework::start`](crate::Framework::start).
#[derive(Clone, Debug, Default)]
pub struct StartOptions {
    /// Prefetch strategy for registered apps.
    pub prefetch: PrefetchStrategy,
    /// Load configuration for route-driven apps and the base of manual loads.
    pub load: LoadConfig,
}

impl StartOptions {
    pub fn with_prefetch(mut self, prefetch: impl Into<PrefetchStrategy>) -> Self {
        self.prefetch = prefetch.into();
        self
    }

    pub fn with_load(mut self, load: LoadConfig) -> Self {
        self.load = load;
        self
    }
}
