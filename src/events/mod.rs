//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the framework, the lifecycle
//! orchestrator, the global state bus and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Framework`, `Orchestrator` hook chains, `GlobalState`,
//!   `MicroApp` parcels, prefetch tasks, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Framework::subscriber_listener()` (fans out to `SubscriberSet`
//!   and updates `MountedTracker`).
//!
//! Consistency warnings (unchanged state, rejected keys, sandbox downgrades) travel
//! on the same bus; this is the crate's only diagnostic channel.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
