//! # One-shot completion carrying a value.
//!
//! [`Deferred`] is resolved at most once; every waiter, early or late, observes the
//! same value. Backed by `tokio::sync::watch`, so resolution never blocks.

use tokio::sync::watch;

pub(crate) struct Deferred<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone + Send + Sync> Deferred<T> {
    pub(crate) fn new() -> Self {
        Self {
            tx: watch::Sender::new(None),
        }
    }

    /// Resolves with `value`. Returns `false` if already resolved (value dropped).
    pub(crate) fn resolve(&self, value: T) -> bool {
        let mut value = Some(value);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = value.take();
            true
        })
    }

    #[cfg(test)]
    pub(crate) fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Waits for resolution.
    pub(crate) async fn wait(&self) -> T {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(value) = rx.borrow_and_update().as_ref() {
                return value.clone();
            }
            // The sender lives in `self`, so the channel cannot close while we wait.
            let _ = rx.changed().await;
        }
    }
}
