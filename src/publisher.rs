//! # Publisher: the producer's write-only handle.
//!
//! Publishing is simply writing into the intake queue; there is no separate
//! publish call on the broadcaster. Sending suspends while the queue is full,
//! which is the only backpressure a producer ever sees. A slow subscriber never
//! blocks the producer beyond that. With an intake capacity of `0` every send
//! waits until the dispatch loop takes the value.

use crate::error::BroadcastError;

/// Cloneable handle for enqueueing values for fan-out.
#[derive(Debug)]
pub struct Publisher<T> {
    tx: flume::Sender<T>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Publisher<T> {
    pub(crate) fn new(tx: flume::Sender<T>) -> Self {
        Self { tx }
    }

    /// Enqueues `value`, waiting for space if the intake queue is full.
    ///
    /// Fails with [`BroadcastError::Closed`] once the dispatch loop has stopped.
    pub async fn send(&self, value: T) -> Result<(), BroadcastError> {
        self.tx
            .send_async(value)
            .await
            .map_err(|_| BroadcastError::Closed)
    }

    /// Blocking variant of [`send`](Self::send) for producers outside the async runtime.
    ///
    /// Blocks the calling thread; do not call it from an async task.
    pub fn blocking_send(&self, value: T) -> Result<(), BroadcastError> {
        self.tx.send(value).map_err(|_| BroadcastError::Closed)
    }

    /// True once the dispatch loop has stopped and no value can be enqueued.
    pub fn is_closed(&self) -> bool {
        self.tx.is_disconnected()
    }

    /// Values waiting in the intake queue for the dispatch loop.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// True if the dispatch loop has caught up with every enqueued value.
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}
