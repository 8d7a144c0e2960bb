//! # Singular barrier.
//!
//! At most one outstanding completion signal, process-wide, meaning "the last
//! singular app has not finished unmounting yet".
//!
//! ```text
//! load / mount (singular) ── wait() ──► returns once the current signal is released
//! after mount             ── arm()  ──► fresh signal (previous one is dropped, not released)
//! end of unmount          ── release() ──► current signal completes
//! ```
//!
//! One shared signal rather than per-pair tracking: concurrent non-adjacent
//! transitions may be over- or under-serialized. Callers that bypass the framework
//! and mount several singular apps at once defeat it.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub(crate) struct SingularBarrier {
    current: Mutex<Option<CancellationToken>>,
}

impl SingularBarrier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits for the signal that is current at call time. Returns immediately if none.
    pub(crate) async fn wait(&self) {
        let current = self.current.lock().clone();
        if let Some(token) = current {
            token.cancelled().await;
        }
    }

    /// Replaces the current signal with a fresh, unreleased one.
    pub(crate) fn arm(&self) {
        *self.current.lock() = Some(CancellationToken::new());
    }

    /// Completes the current signal, if any.
    pub(crate) fn release(&self) {
        if let Some(token) = self.current.lock().as_ref() {
            token.cancel();
        }
    }

    /// Releases and forgets the current signal.
    pub(crate) fn reset(&self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn waits_until_release() {
        let barrier = Arc::new(SingularBarrier::new());
        barrier.wait().await;

        barrier.arm();
        assert!(barrier.is_pending());
        let waiter = {
            let b = Arc::clone(&barrier);
            tokio::spawn(async move { b.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        barrier.release();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("released")
            .unwrap();
        assert!(!barrier.is_pending());
    }

    #[tokio::test]
    async fn reset_releases_waiters() {
        let barrier = SingularBarrier::new();
        barrier.arm();
        barrier.reset();
        barrier.wait().await;
        assert!(!barrier.is_pending());
    }
}
