//! # Subscriber registry.
//!
//! Holds the sending half of every live subscription, keyed by [`SubscriberId`].
//! Membership here is the only authority for "is this subscriber live".
//!
//! ## Locking
//! ```text
//! dispatch fan-out pass ──► read lock (held for the whole pass)
//! subscribe / unsubscribe / close / prune ──► write lock
//! ```
//! A stalled subscriber inside a fan-out pass delays writers by at most the
//! delivery timeout (or until shutdown when no timeout is configured).
//!
//! ## Rules
//! - `add` fails with [`BroadcastError::Closed`] once shutdown has fired; the
//!   check happens under the write lock, so it cannot interleave with `clear`.
//! - Removing an entry drops its sender (the only one); the subscriber observes
//!   the close after draining what was already buffered.
//! - All removals are no-ops for unknown ids.

use std::collections::HashMap;

use tokio::sync::{RwLock, RwLockReadGuard};

use super::shutdown::Shutdown;
use crate::error::BroadcastError;
use crate::subscription::{SubscriberId, Subscription};

pub(crate) type Senders<T> = HashMap<SubscriberId, flume::Sender<T>>;

struct Inner<T> {
    senders: Senders<T>,
}

/// Lock-guarded set of subscriber channels.
pub(crate) struct Registry<T> {
    inner: RwLock<Inner<T>>,
}

/// Read view held by the dispatch loop during one fan-out pass.
pub(crate) struct Snapshot<'a, T> {
    guard: RwLockReadGuard<'a, Inner<T>>,
}

impl<T> Snapshot<'_, T> {
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&SubscriberId, &flume::Sender<T>)> {
        self.guard.senders.iter()
    }
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                senders: HashMap::new(),
            }),
        }
    }

    /// Creates a subscriber channel with `capacity` slots and registers it.
    ///
    /// `capacity = 0` gives a rendezvous channel.
    pub(crate) async fn add(
        &self,
        shutdown: &Shutdown,
        capacity: usize,
    ) -> Result<Subscription<T>, BroadcastError>
    where
        T: 'static,
    {
        let mut inner = self.inner.write().await;
        if shutdown.is_fired() {
            return Err(BroadcastError::Closed);
        }

        let id = SubscriberId::next();
        let (tx, rx) = flume::bounded(capacity);
        inner.senders.insert(id, tx);
        Ok(Subscription::new(id, rx))
    }

    /// Removes one subscriber. Returns `true` if it was registered.
    pub(crate) async fn remove(&self, id: SubscriberId) -> bool {
        self.inner.write().await.senders.remove(&id).is_some()
    }

    /// Removes every listed subscriber; returns how many were actually present.
    pub(crate) async fn prune(&self, ids: &[SubscriberId]) -> usize {
        let mut inner = self.inner.write().await;
        ids.iter()
            .filter(|id| inner.senders.remove(*id).is_some())
            .count()
    }

    /// Drops every sender, closing all subscriptions. Returns how many were closed.
    pub(crate) async fn clear(&self) -> usize {
        let drained: Senders<T> = {
            let mut inner = self.inner.write().await;
            std::mem::take(&mut inner.senders)
        };
        drained.len()
    }

    pub(crate) async fn snapshot(&self) -> Snapshot<'_, T> {
        Snapshot {
            guard: self.inner.read().await,
        }
    }

    pub(crate) async fn len(&self) -> usize {
        self.inner.read().await.senders.len()
    }
}
