//! # One-shot shutdown signal.
//!
//! [`Shutdown`] wraps a [`CancellationToken`]: once fired it stays fired, and
//! any number of observers (the dispatch loop, every in-flight delivery, every
//! `subscribe` call) can check or await it without consuming it.
//!
//! ## Rules
//! - `fire()` is idempotent; only the first call reports `true`.
//! - `is_fired()` never blocks and may be called any number of times.
//! - `fired()` completes immediately if the signal already fired.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Shared, permanently observable termination flag.
#[derive(Clone, Debug, Default)]
pub(crate) struct Shutdown {
    token: CancellationToken,
    first: Arc<AtomicBool>,
}

impl Shutdown {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Returns `true` only for the call that fired it.
    pub(crate) fn fire(&self) -> bool {
        let first = !self.first.swap(true, Ordering::AcqRel);
        self.token.cancel();
        first
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the signal has fired.
    pub(crate) fn fired(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fire_once() {
        let s = Shutdown::new();
        assert!(!s.is_fired());
        assert!(s.fire());
        assert!(!s.fire());
        assert!(s.is_fired());
    }

    #[tokio::test]
    async fn test_all_clones_observe() {
        let s = Shutdown::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let s = s.clone();
                tokio::spawn(async move { s.fired().await })
            })
            .collect();

        s.fire();
        for w in waiters {
            tokio::time::timeout(Duration::from_secs(1), w)
                .await
                .expect("waiter did not observe shutdown")
                .unwrap();
        }
        // Late observers see it too.
        s.fired().await;
    }
}
