//! # Broadcaster configuration.
//!
//! Provides [`Config`], the two knobs fixed at construction time:
//! the intake queue capacity and the per-subscriber delivery timeout.
//!
//! ## Sentinel values
//! - `intake_capacity = 0` → rendezvous intake: a publish completes only when the
//!   dispatch loop takes the value
//! - `delivery_timeout = 0s` → no timeout (dispatch waits until the subscriber
//!   accepts the value or the broadcaster closes)
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use broadcaster::Config;
//!
//! let mut cfg = Config::default();
//! cfg.intake_capacity = 64;
//! cfg.delivery_timeout = Duration::from_millis(50);
//!
//! assert_eq!(cfg.delivery_timeout(), Some(Duration::from_millis(50)));
//! ```

use std::time::Duration;

/// Construction-time settings for a [`Broadcaster`](crate::Broadcaster).
///
/// ## Field semantics
/// - `intake_capacity`: Size of the queue between producer and dispatch loop (`0` = rendezvous)
/// - `delivery_timeout`: Max wait per subscriber per value (`0s` = wait indefinitely)
///
/// Prefer the helper accessors over checking the `0` sentinels directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the intake queue.
    ///
    /// Publishing suspends the producer once this many values are waiting
    /// for dispatch. With `0` every publish waits for the dispatch loop.
    pub intake_capacity: usize,

    /// Per-subscriber delivery timeout.
    ///
    /// - `Duration::ZERO` = no timeout (block until accepted or closed)
    /// - `> 0` = the value is dropped for a subscriber that does not accept it in time
    ///
    /// Applied uniformly to every subscriber and every value.
    pub delivery_timeout: Duration,
}

impl Config {
    /// Returns the delivery timeout as an `Option`.
    ///
    /// - `None` → wait indefinitely
    /// - `Some(d)` → drop after `d`
    #[inline]
    pub fn delivery_timeout(&self) -> Option<Duration> {
        if self.delivery_timeout == Duration::ZERO {
            None
        } else {
            Some(self.delivery_timeout)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `intake_capacity = 1024`
    /// - `delivery_timeout = 0s` (no timeout)
    fn default() -> Self {
        Self {
            intake_capacity: 1024,
            delivery_timeout: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let cfg = Config::default();
        assert_eq!(cfg.delivery_timeout(), None);
    }

    #[test]
    fn test_nonzero_timeout() {
        let cfg = Config {
            intake_capacity: 4,
            delivery_timeout: Duration::from_millis(10),
        };
        assert_eq!(cfg.delivery_timeout(), Some(Duration::from_millis(10)));
    }
}
