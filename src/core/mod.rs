//! Broadcaster core: registry, dispatch and shutdown.
//!
//! The only public API from this module is [`Broadcaster`].
//!
//! Internal modules:
//! - [`broadcaster`]: public facade (subscribe / unsubscribe / close / sender);
//! - [`dispatch`]: the dispatch loop and timeout-bounded delivery;
//! - [`registry`]: lock-guarded set of subscriber channels;
//! - [`shutdown`]: one-shot, non-consuming shutdown signal.

mod broadcaster;
mod dispatch;
mod registry;
mod shutdown;

pub use broadcaster::Broadcaster;
