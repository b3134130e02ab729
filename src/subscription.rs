//! # Subscription: the receive side of one subscriber.
//!
//! Every call to [`Broadcaster::subscribe`](crate::Broadcaster::subscribe) creates an
//! independent bounded queue and returns its receiving half wrapped in a
//! [`Subscription`]. The broadcaster keeps the sending half in its registry,
//! keyed by the subscription's [`SubscriberId`].
//!
//! A buffer of `0` is a rendezvous queue: a value is handed over only while
//! the subscriber is waiting in `recv()`; otherwise dispatch waits (up to the
//! delivery timeout) and the value is never parked in the queue.
//!
//! ## Rules
//! - Values arrive in publish order (per-subscriber FIFO).
//! - `recv()` returns `None` once the subscription is closed **and** drained.
//! - Closing is idempotent: the subscriber, `unsubscribe`, and `close` may all
//!   race to close the same subscription without harm.
//!
//! ## Lifecycle
//! ```text
//! subscribe(m) ──► Open ──┬─ unsubscribe(&mut sub) ──► Closed (removed from registry, drainable)
//!                         ├─ broadcaster.close()   ──► Closed (registry cleared, drainable)
//!                         └─ sub.close() / drop     ──► Closed (buffer discarded, pruned on next dispatch)
//! ```

use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use flume::r#async::RecvStream;
use futures::{Stream, StreamExt};

pub use flume::TryRecvError;

/// Identity of a subscriber.
///
/// Ids are assigned in subscription order and unique across all broadcasters
/// in the process, so a handle can never alias a subscriber of another broadcaster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receive handle for one subscriber.
///
/// Also usable as a [`Stream`] of values.
pub struct Subscription<T: 'static> {
    id: SubscriberId,
    rx: Option<flume::Receiver<T>>,
    stream: Option<RecvStream<'static, T>>,
}

impl<T: 'static> Subscription<T> {
    pub(crate) fn new(id: SubscriberId, rx: flume::Receiver<T>) -> Self {
        Self {
            id,
            rx: Some(rx),
            stream: None,
        }
    }

    /// Returns the id this subscription is registered under.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Receives the next value.
    ///
    /// Returns `None` when the subscription has been closed and every value
    /// buffered before the close has been received.
    pub async fn recv(&mut self) -> Option<T> {
        match &self.rx {
            Some(rx) => rx.recv_async().await.ok(),
            None => None,
        }
    }

    /// Receives a buffered value without waiting.
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        match &self.rx {
            Some(rx) => rx.try_recv(),
            None => Err(TryRecvError::Disconnected),
        }
    }

    /// Closes the subscription from the subscriber side.
    ///
    /// The receiving end is released, so values still buffered are discarded
    /// and the next delivery attempt sees the subscriber as gone. Calling this
    /// more than once, or after the broadcaster closed the subscription, is a no-op.
    pub fn close(&mut self) {
        self.stream = None;
        self.rx = None;
    }

    /// True once the subscription no longer accepts values.
    pub fn is_closed(&self) -> bool {
        self.rx.as_ref().map_or(true, |rx| rx.is_disconnected())
    }

    /// Number of values buffered and not yet received.
    pub fn len(&self) -> usize {
        self.rx.as_ref().map_or(0, |rx| rx.len())
    }

    /// True if no values are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("len", &self.len())
            .finish()
    }
}

impl<T: 'static> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        let Some(rx) = &this.rx else {
            return Poll::Ready(None);
        };
        this.stream
            .get_or_insert_with(|| rx.clone().into_stream())
            .poll_next_unpin(cx)
    }
}
