//! # Memory Management
//!
//! Recycle-only storage for things the world spawns every few seconds.
//!
//! ## Design Philosophy
//!
//! Instances are created at most once. During a run:
//! - No instance is ever destroyed
//! - Exhaustion is reported, never papered over by growing
//! - Reuse order is first released, first reused

mod pool;

pub use pool::{Acquired, PoolHandle, SlotPool};
