//! # STRIDER Core
//!
//! Bounded, recycle-only pools used by the chunk and obstacle streaming
//! layers.
//!
//! ## Architecture Rules
//!
//! 1. **Never destroy** - an instance, once created, lives as long as its pool
//! 2. **Bounded** - a pool never holds more than its cap, exhaustion is a value
//! 3. **Guarded free list** - a slot can never be enqueued twice
//!
//! ## Example
//!
//! ```rust
//! use strider_core::SlotPool;
//!
//! let mut pool: SlotPool<String> = SlotPool::new(50);
//! pool.prewarm(10, |h| format!("chunk-{}", h.index()));
//! assert_eq!(pool.free_count(), 10);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod memory;
pub mod sync;

pub use error::{PoolError, PoolResult};
pub use memory::{Acquired, PoolHandle, SlotPool};
pub use sync::SharedPool;
