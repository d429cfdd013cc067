//! # Shared Pool
//!
//! A cloneable handle to one [`SlotPool`] behind a `parking_lot` mutex.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PoolResult;
use crate::memory::{Acquired, PoolHandle, SlotPool};

/// Mutex-serialized pool that can be shared between threads.
///
/// Every clone refers to the same underlying pool.
#[derive(Debug)]
pub struct SharedPool<T> {
    inner: Arc<Mutex<SlotPool<T>>>,
}

impl<T> Clone for SharedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedPool<T> {
    /// Creates an empty shared pool with the given cap.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self::from_pool(SlotPool::new(max_size))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: SlotPool<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    /// Creates up to `count` free instances. See [`SlotPool::prewarm`].
    pub fn prewarm<F>(&self, count: usize, factory: F) -> usize
    where
        F: FnMut(PoolHandle) -> T,
    {
        self.inner.lock().prewarm(count, factory)
    }

    /// Takes an instance. See [`SlotPool::acquire_with`].
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`](crate::PoolError::Exhausted) when the
    /// pool is at its cap with nothing free.
    pub fn acquire_with<F>(&self, factory: F) -> PoolResult<Acquired>
    where
        F: FnOnce(PoolHandle) -> T,
    {
        self.inner.lock().acquire_with(factory)
    }

    /// Returns an instance. See [`SlotPool::release`].
    ///
    /// # Errors
    ///
    /// Same as [`SlotPool::release`].
    pub fn release(&self, handle: PoolHandle) -> PoolResult<()> {
        self.inner.lock().release(handle)
    }

    /// Runs `f` with exclusive access to the pool.
    ///
    /// Keep the closure short: every other user of the pool waits on it.
    pub fn with<R>(&self, f: impl FnOnce(&mut SlotPool<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Number of instances in use.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.lock().active_count()
    }

    /// Number of instances ever created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.inner.lock().created()
    }
}
