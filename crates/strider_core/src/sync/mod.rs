//! # Serialized Pool Access
//!
//! The world tick is single-threaded. A caller that prefetches chunks on a
//! background thread goes through [`SharedPool`] so every free-list mutation
//! happens under one lock.
//!
//! ```text
//! Tick thread:      acquire ─┐            ┌─ release
//!                            ▼            ▼
//!                    Arc<Mutex<SlotPool<T>>>
//!                            ▲
//! Prefetch thread:  prewarm ─┘
//! ```

mod shared_pool;

pub use shared_pool::SharedPool;
