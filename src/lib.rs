//! # broadcaster
//!
//! **broadcaster** is a single-writer, multi-reader fan-out primitive for tokio.
//!
//! One producer publishes values of any `Clone + Send` type. Any number of
//! subscribers may join or leave at any time; each receives every value
//! dispatched after it joined, through its own bounded queue.
//!
//! ## Architecture
//! ```text
//!   Publisher ──► [intake queue] ──► dispatch loop ──► Registry (read lock per pass)
//!                                                      ├──► [queue S1] ──► Subscription
//!                                                      ├──► [queue S2] ──► Subscription
//!                                                      └──► [queue SN] ──► Subscription
//! ```
//!
//! ## Delivery guarantees
//! - Per-subscriber FIFO.
//! - No ordering across subscribers for the same value.
//! - With a delivery timeout `T > 0`, a subscriber that does not accept a
//!   value within `T` silently misses it; the others are unaffected.
//! - With `T = 0` dispatch waits for each subscriber until it accepts or the
//!   broadcaster closes.
//! - No replay: late subscribers only see values dispatched after they joined.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use broadcaster::Broadcaster;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), broadcaster::BroadcastError> {
//!     let b = Broadcaster::new(10, Duration::ZERO);
//!     let mut sub = b.subscribe(2).await?;
//!
//!     b.sender().send("Hello, Broadcasters!").await?;
//!     assert_eq!(sub.recv().await, Some("Hello, Broadcasters!"));
//!
//!     b.close().await;
//!     assert_eq!(sub.recv().await, None);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod publisher;
mod stats;
mod subscription;

// ---- Public re-exports ----

pub use config::Config;
pub use self::core::Broadcaster;
pub use error::BroadcastError;
pub use publisher::Publisher;
pub use stats::StatsSnapshot;
pub use subscription::{SubscriberId, Subscription, TryRecvError};
