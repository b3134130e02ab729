//! Error types returned by the broadcaster.
//!
//! There is a single failure the caller ever sees: the broadcaster has been
//! closed. Delivery timeouts and subscriber-side closes are handled inside the
//! dispatch loop and never surface as errors.

use thiserror::Error;

/// # Errors produced by the broadcaster.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastError {
    /// The broadcaster was closed; no new subscribers are accepted and
    /// published values can no longer be dispatched.
    #[error("broadcaster is closed")]
    Closed,
}

impl BroadcastError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use broadcaster::BroadcastError;
    ///
    /// assert_eq!(BroadcastError::Closed.as_label(), "broadcaster_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BroadcastError::Closed => "broadcaster_closed",
        }
    }
}
