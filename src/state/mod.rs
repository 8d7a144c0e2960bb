//! # Cross-app global state bus.
//!
//! A process-scoped keyed store ([`GlobalState`]) plus per-subscriber action handles
//! ([`MicroAppStateActions`]).
//!
//! ```text
//! init_global_state(initial) ──► master actions (id "global-<ms>")
//! instance load               ──► consumer actions (id = instance id)
//!
//! set_global_state(partial)
//!     ├─ empty / unchanged        ─► false, StateUnchanged
//!     ├─ non-master + new key     ─► key skipped, StateKeyRejected
//!     ├─ nothing applied          ─► false
//!     └─ applied                  ─► every listener(new, prev), registration order
//! ```
//!
//! ## Rules
//! - Only master actions may introduce new top-level keys.
//! - One listener per subscriber id; a second registration replaces the first.
//! - Listeners receive snapshots; the live store is never handed out by reference.
//! - Listeners run after the store lock is released, so they may write back.
//! - A panicking listener stops the rest of that notification pass.

mod actions;
mod store;

pub use actions::MicroAppStateActions;
pub use store::{GlobalState, StateCallback, StateMap};
pub(crate) use store::unix_ms;
