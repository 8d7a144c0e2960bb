//! # Mounted-app tracker with sequence-based ordering.
//!
//! Maintains which apps are currently mounted, using event sequence numbers to
//! handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! hook chains ──► Bus ──► Framework listener ──► MountedTracker::update()
//!                                                       │
//!                                                       ▼
//!                                          HashMap<String, MountState>
//!                                              (app → {seq, mounted})
//! ```
//!
//! ## Rules
//! - Only `AppMounted` / `AppUnmounted` / `AppBroken` change mounted state
//! - Other events carrying an app name only advance its sequence
//! - Events with `seq <= last_seq` are rejected (stale)

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

#[derive(Debug, Clone)]
struct MountState {
    last_seq: u64,
    mounted: bool,
}

/// Thread-safe tracker of mounted apps, keyed by app name.
#[derive(Default)]
pub struct MountedTracker {
    state: RwLock<HashMap<String, MountState>>,
}

impl MountedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `ev` if it is newer than the last one seen for its app.
    /// Returns `true` when the mounted state was written.
    ///
    /// ```text
    /// update(AppUnmounted, seq=100) → mounted=false, last_seq=100
    /// update(AppMounted,   seq=99)  → rejected (stale)
    /// ```
    pub async fn update(&self, ev: &Event) -> bool {
        let Some(name) = ev.app.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(MountState {
            last_seq: 0,
            mounted: false,
        });
        if ev.seq <= entry.last_seq && entry.last_seq != 0 {
            return false;
        }
        entry.last_seq = ev.seq;
        match ev.kind {
            EventKind::AppMounted => {
                entry.mounted = true;
                true
            }
            EventKind::AppUnmounted | EventKind::AppBroken => {
                entry.mounted = false;
                true
            }
            _ => false,
        }
    }

    /// Sorted names of mounted apps.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut mounted: Vec<String> = state
            .iter()
            .filter(|(_, s)| s.mounted)
            .map(|(name, _)| name.clone())
            .collect();
        mounted.sort_unstable();
        mounted
    }

    pub async fn is_mounted(&self, name: &str) -> bool {
        self.state
            .read()
            .await
            .get(name)
            .is_some_and(|s| s.mounted)
    }

    pub async fn clear(&self) {
        self.state.write().await.clear();
    }
}
