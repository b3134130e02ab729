//! # Broadcaster: the public facade.
//!
//! [`Broadcaster`] composes the intake queue, the subscriber registry, the
//! dispatch loop and the shutdown signal.
//!
//! ## Architecture
//! ```text
//! Publisher::send(v) ──► [intake queue, cap N] ──► dispatch loop (one task)
//!                                                      │ read lock (one pass)
//!                                                      ▼
//!                                  ┌──────────── Registry ────────────┐
//!                                  ▼                ▼                 ▼
//!                            [queue S1, M1]   [queue S2, M2]  ...  [queue SN, MN]
//!                                  │                │                 │
//!                             Subscription     Subscription      Subscription
//!
//! close():
//!   Shutdown::fire() ──► dispatch loop exits (in-flight pass abandoned)
//!                    └─► Registry::clear() (every subscription closes)
//!                    └─► join dispatch task
//! ```
//!
//! ## Rules
//! - `subscribe` after `close` fails with [`BroadcastError::Closed`] and creates nothing.
//! - `unsubscribe` is a no-op for unknown subscriptions and always leaves the
//!   handle closed.
//! - `close` is idempotent; every call, including concurrent ones, returns only
//!   once the dispatch loop has stopped.
//! - Dropping the broadcaster fires shutdown, so the loop never outlives it.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared as SharedFuture};
use futures::FutureExt;
use tokio::task::JoinError;
use tracing::{debug, warn};

use super::dispatch::Dispatcher;
use super::registry::Registry;
use super::shutdown::Shutdown;
use crate::config::Config;
use crate::error::BroadcastError;
use crate::publisher::Publisher;
use crate::stats::{Stats, StatsSnapshot};
use crate::subscription::Subscription;

/// State shared between the facade and the dispatch loop.
pub(crate) struct Shared<T> {
    pub(crate) registry: Registry<T>,
    pub(crate) shutdown: Shutdown,
    pub(crate) stats: Stats,
    pub(crate) timeout: Option<Duration>,
}

/// Fans every published value out to all current subscribers.
///
/// Must be created inside a tokio runtime: construction spawns the dispatch task.
pub struct Broadcaster<T> {
    cfg: Config,
    shared: Arc<Shared<T>>,
    intake: flume::Sender<T>,
    dispatcher: SharedFuture<BoxFuture<'static, ()>>,
}

impl<T> Broadcaster<T>
where
    T: Clone + Send + 'static,
{
    /// Creates a broadcaster with an intake queue of `intake_capacity` values
    /// and a per-subscriber `delivery_timeout` (`Duration::ZERO` = wait indefinitely).
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn new(intake_capacity: usize, delivery_timeout: Duration) -> Self {
        Self::with_config(Config {
            intake_capacity,
            delivery_timeout,
        })
    }

    /// Creates a broadcaster from a [`Config`].
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn with_config(cfg: Config) -> Self {
        let (intake, rx) = flume::bounded(cfg.intake_capacity);
        let shared = Arc::new(Shared {
            registry: Registry::new(),
            shutdown: Shutdown::new(),
            stats: Stats::default(),
            timeout: cfg.delivery_timeout(),
        });

        let dispatcher = Dispatcher::new(Arc::clone(&shared), rx)
            .spawn()
            .map(log_join)
            .boxed()
            .shared();
        debug!(
            intake_capacity = cfg.intake_capacity,
            delivery_timeout = ?cfg.delivery_timeout,
            "broadcaster started"
        );

        Self {
            cfg,
            shared,
            intake,
            dispatcher,
        }
    }

    /// Registers a new subscriber whose queue buffers `buffer` values.
    ///
    /// The subscriber receives every value dispatched after registration.
    /// With `buffer = 0` a value is only handed over while the subscriber is
    /// waiting in `recv()`.
    pub async fn subscribe(&self, buffer: usize) -> Result<Subscription<T>, BroadcastError> {
        let sub = self
            .shared
            .registry
            .add(&self.shared.shutdown, buffer)
            .await?;
        debug!(subscriber = %sub.id(), buffer, "subscribed");
        Ok(sub)
    }

    /// Removes `sub` from the broadcaster and closes it.
    ///
    /// Values buffered before the call can still be drained from `sub`;
    /// nothing published afterwards reaches it.
    pub async fn unsubscribe(&self, sub: &mut Subscription<T>) {
        if self.shared.registry.remove(sub.id()).await {
            debug!(subscriber = %sub.id(), "unsubscribed");
        } else {
            sub.close();
        }
    }

    /// Returns the producer's handle to the intake queue.
    pub fn sender(&self) -> Publisher<T> {
        Publisher::new(self.intake.clone())
    }
}

impl<T> Broadcaster<T> {
    /// Shuts the broadcaster down.
    ///
    /// Fires the shutdown signal (abandoning any in-flight fan-out pass), closes
    /// every remaining subscription and waits for the dispatch task to stop.
    /// Concurrent and repeated calls all wait on the same dispatch task.
    pub async fn close(&self) {
        if self.shared.shutdown.fire() {
            debug!("broadcaster closing");
        }

        let closed = self.shared.registry.clear().await;
        if closed > 0 {
            debug!(subscribers = closed, "closed remaining subscriptions");
        }

        self.dispatcher.clone().await;
    }

    /// True once [`close`](Self::close) has been called or the broadcaster is dropping.
    pub fn is_closed(&self) -> bool {
        self.shared.shutdown.is_fired()
    }

    /// Number of currently registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.shared.registry.len().await
    }

    /// The configuration this broadcaster was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Point-in-time delivery counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }
}

fn log_join(res: Result<(), JoinError>) {
    if let Err(err) = res {
        warn!(error = %err, "dispatch task ended abnormally");
    }
}

impl<T> Drop for Broadcaster<T> {
    fn drop(&mut self) {
        self.shared.shutdown.fire();
    }
}

impl<T> std::fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("cfg", &self.cfg)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bcast(n: usize, timeout_ms: u64) -> Broadcaster<u32> {
        Broadcaster::new(n, Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn test_subscribe_counts() {
        let b = bcast(4, 0);
        let mut s1 = b.subscribe(1).await.unwrap();
        let _s2 = b.subscribe(1).await.unwrap();
        assert_eq!(b.subscriber_count().await, 2);

        b.unsubscribe(&mut s1).await;
        assert_eq!(b.subscriber_count().await, 1);
        b.close().await;
        assert_eq!(b.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let b = bcast(4, 0);
        let mut sub = b.subscribe(2).await.unwrap();

        b.close().await;
        b.close().await;

        assert!(b.is_closed());
        assert_eq!(sub.recv().await, None);
        assert_eq!(b.subscribe(1).await.unwrap_err(), BroadcastError::Closed);
    }

    #[tokio::test]
    async fn test_unsubscribe_twice_is_noop() {
        let b = bcast(4, 0);
        let mut sub = b.subscribe(2).await.unwrap();

        b.unsubscribe(&mut sub).await;
        b.unsubscribe(&mut sub).await;
        assert!(sub.is_closed());
        assert_eq!(sub.recv().await, None);
        b.close().await;
    }

    #[tokio::test]
    async fn test_stats_track_delivery() {
        let b = bcast(4, 0);
        let mut sub = b.subscribe(4).await.unwrap();

        b.sender().send(1).await.unwrap();
        b.sender().send(2).await.unwrap();
        assert_eq!(sub.recv().await, Some(1));
        assert_eq!(sub.recv().await, Some(2));

        let stats = b.stats();
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.timed_out, 0);
        b.close().await;
    }

    #[tokio::test]
    async fn test_config_and_debug() {
        let b = bcast(0, 25);
        assert_eq!(b.config().intake_capacity, 0);
        assert_eq!(b.config().delivery_timeout(), Some(Duration::from_millis(25)));
        assert!(format!("{b:?}").contains("closed: false"));
        b.close().await;
    }

    #[tokio::test]
    async fn test_unsubscribe_keeps_buffered_values() {
        let b = bcast(4, 0);
        let mut sub = b.subscribe(4).await.unwrap();
        b.sender().send(1).await.unwrap();
        while b.stats().delivered == 0 {
            tokio::task::yield_now().await;
        }

        b.unsubscribe(&mut sub).await;
        assert!(sub.is_closed());
        assert_eq!(sub.recv().await, Some(1));
        assert_eq!(sub.recv().await, None);
        b.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_close_waits_for_dispatch_loop() {
        let b = Arc::new(bcast(4, 0));
        let _stalled = b.subscribe(0).await.unwrap();
        b.sender().send(1).await.unwrap();

        let mut closers = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let b = Arc::clone(&b);
            let tx = b.sender();
            closers.spawn(async move {
                b.close().await;
                tx.is_closed()
            });
        }
        while let Some(res) = closers.join_next().await {
            assert!(res.unwrap(), "close returned before the dispatch loop stopped");
        }
    }
}
