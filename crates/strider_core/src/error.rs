//! # Pool Errors
//!
//! Exhaustion is an expected outcome, not a fault: callers skip the unit of
//! work and try again next tick.

use thiserror::Error;

use crate::memory::PoolHandle;

/// Errors returned by [`SlotPool`](crate::SlotPool) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Every instance is in use and the pool is at its cap.
    #[error("pool exhausted: all {max_size} instances are in use")]
    Exhausted {
        /// The pool's instance cap.
        max_size: usize,
    },

    /// The handle does not name a slot of this pool.
    #[error("invalid pool handle {0:?}")]
    InvalidHandle(PoolHandle),

    /// The handle names a slot that is already free (double return).
    #[error("pool handle {0:?} is not in use")]
    NotInUse(PoolHandle),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
