//! # Event subscribers for the microvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for handling runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   hook chain ── publish(Event) ──► Bus ──► Framework::subscriber_listener
//!                                                 │
//!                                                 ├──► MountedTracker (mounted instances)
//!                                                 │
//!                                                 └──► SubscriberSet::emit_arc
//!                                                           │
//!                                                      ┌────┴────┬─────────┐
//!                                                      ▼         ▼         ▼
//!                                                  LogWriter  Metrics   Custom
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
