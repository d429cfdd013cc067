//! # Slot Pool
//!
//! Bounded reuse pool for objects that are spawned and retired constantly.
//!
//! Instances are created lazily (or up front via [`SlotPool::prewarm`]) and
//! are never destroyed: a released instance goes to the back of the free
//! queue and is handed out again, oldest first.

use std::collections::VecDeque;

use crate::error::{PoolError, PoolResult};

/// A bounded pool of reusable instances.
///
/// The pool owns every instance it ever created. A slot is either in the
/// free queue or in use, never both.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Wrap it in a [`SharedPool`](crate::SharedPool)
/// when it has to be reached from more than one thread.
///
/// # Example
///
/// ```rust
/// use strider_core::SlotPool;
///
/// let mut pool: SlotPool<u32> = SlotPool::new(2);
/// let first = pool.acquire_with(|_| 7).unwrap();
/// assert!(!first.reused);
///
/// pool.release(first.handle).unwrap();
/// let again = pool.acquire_with(|_| 0).unwrap();
/// assert!(again.reused);
/// assert_eq!(pool.get(again.handle), Some(&7));
/// ```
#[derive(Debug)]
pub struct SlotPool<T> {
    /// Every instance ever created, indexed by handle.
    slots: Vec<T>,
    /// In-use flag per slot.
    in_use: Vec<bool>,
    /// Free slots, oldest release first.
    free: VecDeque<usize>,
    /// Number of slots currently in use.
    active_count: usize,
    /// Cap on `slots.len()`.
    max_size: usize,
}

/// Handle to a slot in a [`SlotPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle {
    /// Index into the pool.
    index: usize,
}

impl PoolHandle {
    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

/// Result of a successful [`SlotPool::acquire_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acquired {
    /// The acquired slot.
    pub handle: PoolHandle,
    /// `true` when an existing instance was recycled, `false` when the
    /// factory created a new one.
    pub reused: bool,
}

impl<T> SlotPool<T> {
    /// Creates an empty pool that will hold at most `max_size` instances.
    ///
    /// A cap of zero is raised to one.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            slots: Vec::with_capacity(max_size),
            in_use: Vec::with_capacity(max_size),
            free: VecDeque::with_capacity(max_size),
            active_count: 0,
            max_size,
        }
    }

    /// Creates up to `count` free instances ahead of time.
    ///
    /// Stops at the cap. Returns how many instances were created.
    pub fn prewarm<F>(&mut self, count: usize, mut factory: F) -> usize
    where
        F: FnMut(PoolHandle) -> T,
    {
        let room = self.max_size - self.slots.len();
        let count = count.min(room);
        for _ in 0..count {
            let handle = self.push_slot(&mut factory);
            self.free.push_back(handle.index);
        }
        count
    }

    /// Takes an instance out of the pool.
    ///
    /// The oldest free instance is reused if there is one. Otherwise a new
    /// instance is built with `factory`, as long as the cap allows it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] when every instance is in use and the
    /// pool is at its cap. Nothing is created in that case.
    pub fn acquire_with<F>(&mut self, factory: F) -> PoolResult<Acquired>
    where
        F: FnOnce(PoolHandle) -> T,
    {
        if let Some(index) = self.free.pop_front() {
            self.in_use[index] = true;
            self.active_count += 1;
            return Ok(Acquired {
                handle: PoolHandle { index },
                reused: true,
            });
        }

        if self.slots.len() >= self.max_size {
            return Err(PoolError::Exhausted {
                max_size: self.max_size,
            });
        }

        let handle = PoolHandle {
            index: self.slots.len(),
        };
        self.slots.push(factory(handle));
        self.in_use.push(true);
        self.active_count += 1;
        Ok(Acquired {
            handle,
            reused: false,
        })
    }

    /// Returns an instance to the free queue.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidHandle`] if the handle is not from this pool.
    /// - [`PoolError::NotInUse`] if the slot is already free. The free queue
    ///   is left untouched, so a double return can never enqueue twice.
    pub fn release(&mut self, handle: PoolHandle) -> PoolResult<()> {
        match self.in_use.get(handle.index) {
            None => Err(PoolError::InvalidHandle(handle)),
            Some(false) => Err(PoolError::NotInUse(handle)),
            Some(true) => {
                self.in_use[handle.index] = false;
                self.active_count -= 1;
                self.free.push_back(handle.index);
                Ok(())
            }
        }
    }

    /// Gets a reference to an instance, in use or not.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots.get(handle.index)
    }

    /// Gets a mutable reference to an instance, in use or not.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.index)
    }

    /// Returns `true` if the handle names an in-use slot.
    #[inline]
    #[must_use]
    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.in_use.get(handle.index).copied().unwrap_or(false)
    }

    /// Snapshot of every in-use handle, in slot order.
    ///
    /// Use this when the loop body releases handles.
    #[must_use]
    pub fn active_handles(&self) -> Vec<PoolHandle> {
        self.in_use
            .iter()
            .enumerate()
            .filter(|(_, used)| **used)
            .map(|(index, _)| PoolHandle { index })
            .collect()
    }

    /// Iterates over in-use instances.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots
            .iter()
            .zip(self.in_use.iter())
            .enumerate()
            .filter(|(_, (_, used))| **used)
            .map(|(index, (value, _))| (PoolHandle { index }, value))
    }

    /// Iterates mutably over in-use instances.
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> {
        self.slots
            .iter_mut()
            .zip(self.in_use.iter())
            .enumerate()
            .filter(|(_, (_, used))| **used)
            .map(|(index, (value, _))| (PoolHandle { index }, value))
    }

    /// Number of instances ever created.
    #[inline]
    #[must_use]
    pub fn created(&self) -> usize {
        self.slots.len()
    }

    /// Number of instances in use.
    #[inline]
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.active_count
    }

    /// Number of instances waiting in the free queue.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Instance cap.
    #[inline]
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    fn push_slot<F>(&mut self, factory: &mut F) -> PoolHandle
    where
        F: FnMut(PoolHandle) -> T,
    {
        let handle = PoolHandle {
            index: self.slots.len(),
        };
        self.slots.push(factory(handle));
        self.in_use.push(false);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release() {
        let mut pool: SlotPool<u32> = SlotPool::new(10);

        let a = pool.acquire_with(|_| 42).unwrap();
        assert!(!a.reused);
        assert_eq!(*pool.get(a.handle).unwrap(), 42);
        assert_eq!(pool.active_count(), 1);

        pool.release(a.handle).unwrap();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_exhausted_never_creates() {
        let mut pool: SlotPool<u8> = SlotPool::new(50);
        let mut exhausted = 0;
        for i in 0..60 {
            match pool.acquire_with(|_| i as u8) {
                Ok(_) => {}
                Err(PoolError::Exhausted { max_size }) => {
                    assert_eq!(max_size, 50);
                    exhausted += 1;
                }
                Err(other) => panic!("unexpected error {other}"),
            }
        }
        assert_eq!(exhausted, 10);
        assert_eq!(pool.created(), 50);
    }

    #[test]
    fn test_reuse_is_fifo() {
        let mut pool: SlotPool<u32> = SlotPool::new(3);
        let a = pool.acquire_with(|_| 1).unwrap().handle;
        let b = pool.acquire_with(|_| 2).unwrap().handle;

        pool.release(b).unwrap();
        pool.release(a).unwrap();

        let first = pool.acquire_with(|_| 99).unwrap();
        assert!(first.reused);
        assert_eq!(first.handle, b);
        assert_eq!(pool.acquire_with(|_| 99).unwrap().handle, a);
    }

    #[test]
    fn test_double_release_is_guarded() {
        let mut pool: SlotPool<u32> = SlotPool::new(2);
        let h = pool.acquire_with(|_| 1).unwrap().handle;

        pool.release(h).unwrap();
        assert_eq!(pool.release(h), Err(PoolError::NotInUse(h)));
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut small: SlotPool<u32> = SlotPool::new(1);
        let mut big: SlotPool<u32> = SlotPool::new(4);
        for _ in 0..3 {
            big.acquire_with(|_| 0).unwrap();
        }
        let foreign = big.active_handles()[2];
        assert_eq!(small.release(foreign), Err(PoolError::InvalidHandle(foreign)));
        assert!(!small.is_active(foreign));
    }

    #[test]
    fn test_prewarm_respects_cap() {
        let mut pool: SlotPool<usize> = SlotPool::new(5);
        assert_eq!(pool.prewarm(10, PoolHandle::index), 5);
        assert_eq!(pool.free_count(), 5);
        assert_eq!(pool.active_count(), 0);

        let got = pool.acquire_with(|_| 100).unwrap();
        assert!(got.reused);
        assert_eq!(*pool.get(got.handle).unwrap(), 0);
    }

    #[test]
    fn test_conservation_under_churn() {
        let mut pool: SlotPool<u32> = SlotPool::new(8);
        let mut held = Vec::new();
        for round in 0..200u32 {
            if round % 3 == 2 {
                if let Some(h) = held.pop() {
                    pool.release(h).unwrap();
                }
            } else if let Ok(a) = pool.acquire_with(|_| round) {
                held.push(a.handle);
            }
            assert!(pool.created() <= 8);
            assert_eq!(pool.active_count() + pool.free_count(), pool.created());
        }
        for h in held.drain(..) {
            pool.release(h).unwrap();
        }
        assert_eq!(pool.free_count(), pool.created());
    }

    #[test]
    fn test_iter_active_skips_free() {
        let mut pool: SlotPool<u32> = SlotPool::new(4);
        let a = pool.acquire_with(|_| 1).unwrap().handle;
        let _b = pool.acquire_with(|_| 2).unwrap().handle;
        pool.release(a).unwrap();

        let values: Vec<u32> = pool.iter_active().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2]);

        for (_, v) in pool.iter_active_mut() {
            *v += 10;
        }
        assert_eq!(pool.iter_active().map(|(_, v)| *v).sum::<u32>(), 12);
    }
}
