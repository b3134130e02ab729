//! # Dispatch loop: drains the intake queue and fans values out.
//!
//! One dispatcher task runs per broadcaster, from construction until shutdown.
//!
//! ## Loop
//! ```text
//! loop {
//!     select (biased) {
//!         shutdown fired        → Terminated
//!         intake.recv() = Err   → Terminated (all publishers gone)
//!         intake.recv() = v     → fan_out(v)
//!                                   ├─ every subscriber: deliver(v.clone())
//!                                   ├─ Shutdown during a delivery → Terminated
//!                                   └─ prune subscribers found closed
//!     }
//! }
//! ```
//!
//! ## Delivery race (per subscriber, per value)
//! - subscriber accepts        → `Accepted`
//! - delivery timeout elapses  → `TimedOut` (value dropped for this subscriber only)
//! - receiver already closed   → `Gone` (subscriber pruned after the pass)
//!
//! A timed-out send is withdrawn from the subscriber queue, so on a zero-capacity
//! queue nothing is left behind for a reader that arrives late.
//! - shutdown fires            → `Shutdown` (rest of the pass abandoned)
//!
//! ## Ordering
//! - Successive values reach one subscriber in intake order.
//! - Order across subscribers for the same value is unspecified.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, trace};

use super::broadcaster::Shared;
use super::shutdown::Shutdown;

/// Outcome of one timeout-bounded delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Accepted,
    TimedOut,
    Gone,
    Shutdown,
}

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Completed,
    Aborted,
}

/// Owns the intake receiver; consumed by [`Dispatcher::spawn`].
pub(crate) struct Dispatcher<T> {
    shared: Arc<Shared<T>>,
    intake: flume::Receiver<T>,
}

impl<T> Dispatcher<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn new(shared: Arc<Shared<T>>, intake: flume::Receiver<T>) -> Self {
        Self { shared, intake }
    }

    /// Spawns the loop on the current tokio runtime.
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        debug!("dispatch loop started");
        loop {
            let value = tokio::select! {
                biased;
                _ = self.shared.shutdown.fired() => break,
                msg = self.intake.recv_async() => match msg {
                    Ok(v) => v,
                    Err(_) => break,
                },
            };
            if fan_out(&self.shared, value).await == Pass::Aborted {
                break;
            }
        }
        debug!("dispatch loop stopped");
    }
}

/// Runs one fan-out pass over the subscribers registered at snapshot time.
async fn fan_out<T: Clone>(shared: &Shared<T>, value: T) -> Pass {
    shared.stats.record_dispatched();

    let mut stale = Vec::new();
    {
        let snapshot = shared.registry.snapshot().await;
        for (id, tx) in snapshot.iter() {
            match deliver(tx, value.clone(), shared.timeout, &shared.shutdown).await {
                Delivery::Accepted => shared.stats.record_delivered(),
                Delivery::TimedOut => {
                    shared.stats.record_timed_out();
                    trace!(subscriber = %id, "delivery timed out; value dropped");
                }
                Delivery::Gone => stale.push(*id),
                Delivery::Shutdown => return Pass::Aborted,
            }
        }
    }

    if !stale.is_empty() {
        let pruned = shared.registry.prune(&stale).await;
        shared.stats.record_pruned(pruned);
        debug!(pruned, "removed closed subscribers");
    }
    Pass::Completed
}

/// Sends `value` to one subscriber, racing acceptance against the timeout and shutdown.
///
/// With `timeout = None` the send waits until accepted or shutdown.
pub(crate) async fn deliver<T>(
    tx: &flume::Sender<T>,
    value: T,
    timeout: Option<Duration>,
    shutdown: &Shutdown,
) -> Delivery {
    let send = async {
        match timeout {
            Some(dur) => match time::timeout(dur, tx.send_async(value)).await {
                Ok(Ok(())) => Delivery::Accepted,
                Ok(Err(_)) => Delivery::Gone,
                Err(_elapsed) => Delivery::TimedOut,
            },
            None => match tx.send_async(value).await {
                Ok(()) => Delivery::Accepted,
                Err(_) => Delivery::Gone,
            },
        }
    };

    tokio::select! {
        biased;
        _ = shutdown.fired() => Delivery::Shutdown,
        outcome = send => outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;

    #[tokio::test]
    async fn test_deliver_accepted() {
        let (tx, rx) = flume::bounded(1);
        let shutdown = Shutdown::new();

        let out = deliver(&tx, 9u32, None, &shutdown).await;
        assert_eq!(out, Delivery::Accepted);
        assert_eq!(rx.recv_async().await, Ok(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_times_out_on_full_queue() {
        let (tx, rx) = flume::bounded(1);
        let shutdown = Shutdown::new();
        tx.send_async(1u32).await.unwrap();

        let out = deliver(&tx, 2, Some(Duration::from_millis(50)), &shutdown).await;
        assert_eq!(out, Delivery::TimedOut);
        assert_eq!(rx.recv_async().await, Ok(1));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_zero_capacity_leaves_nothing_behind() {
        let (tx, rx) = flume::bounded::<u32>(0);
        let shutdown = Shutdown::new();

        let out = deliver(&tx, 1, Some(Duration::from_millis(50)), &shutdown).await;
        assert_eq!(out, Delivery::TimedOut);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert!(rx.is_empty());
    }

    #[tokio::test]
    async fn test_deliver_zero_capacity_to_waiting_reader() {
        let (tx, rx) = flume::bounded::<u32>(0);
        let shutdown = Shutdown::new();

        let reader = tokio::spawn(async move { rx.recv_async().await });
        let out = deliver(&tx, 4, Some(Duration::from_secs(5)), &shutdown).await;
        assert_eq!(out, Delivery::Accepted);
        assert_eq!(reader.await.unwrap(), Ok(4));
    }

    #[tokio::test]
    async fn test_deliver_gone_when_receiver_closed() {
        let (tx, rx) = flume::bounded::<u32>(1);
        drop(rx);
        let shutdown = Shutdown::new();

        assert_eq!(deliver(&tx, 1, None, &shutdown).await, Delivery::Gone);
        assert_eq!(
            deliver(&tx, 1, Some(Duration::from_millis(10)), &shutdown).await,
            Delivery::Gone
        );
    }

    #[tokio::test]
    async fn test_deliver_unblocks_on_shutdown() {
        let (tx, _rx) = flume::bounded(1);
        tx.send_async(0u32).await.unwrap();
        let shutdown = Shutdown::new();

        let s = shutdown.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            s.fire();
        });

        let out = time::timeout(Duration::from_secs(2), deliver(&tx, 1, None, &shutdown))
            .await
            .expect("blocked delivery ignored shutdown");
        assert_eq!(out, Delivery::Shutdown);
    }

    #[tokio::test]
    async fn test_deliver_after_shutdown_does_not_send() {
        let (tx, rx) = flume::bounded(4);
        let shutdown = Shutdown::new();
        shutdown.fire();

        assert_eq!(deliver(&tx, 1u32, None, &shutdown).await, Delivery::Shutdown);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }
}
