//! Reusable buffer pool with checkout/checkin semantics.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

use crate::BufferError;

/// Default capacity of a pooled buffer.
pub const MINIMUM_SIZE: usize = 8 * 1024;

/// Free buffers retained per pool.
const MAX_RETAINED: usize = 16;

/// Buffers grown beyond this multiple of the pool minimum are discarded
/// on checkin instead of retained.
const RETAIN_FACTOR: usize = 8;

/// A pool of reusable byte buffers.
///
/// `acquire` checks a buffer out; dropping the returned [`PooledBuffer`]
/// checks it back in. A checked-out buffer is exclusively owned, so
/// concurrent operations never observe each other's bytes. An empty pool
/// allocates a fresh buffer rather than blocking.
///
/// Buffer sizing is per pool, not global: every pool carries its own
/// minimum capacity and optional growth ceiling, so pools with different
/// defaults can coexist.
pub struct BufferPool {
    min_size: usize,
    max_size: Option<usize>,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Creates a shared pool with [`MINIMUM_SIZE`] buffers and no growth
    /// ceiling.
    pub fn new() -> Arc<Self> {
        Self::with_config(MINIMUM_SIZE, None)
    }

    /// Creates a shared pool with a custom minimum buffer capacity and an
    /// optional hard ceiling on buffer growth.
    pub fn with_config(min_size: usize, max_size: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            min_size,
            max_size,
            free: Mutex::new(Vec::new()),
        })
    }

    /// The capacity every acquired buffer starts with.
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// The growth ceiling, if one is configured.
    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Checks a buffer out of the pool, allocating a fresh one when no
    /// free buffer is available.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let recycled = self.free_list().pop();
        let data = recycled.unwrap_or_else(|| vec![0u8; self.min_size]);
        PooledBuffer {
            data,
            pool: Arc::clone(self),
        }
    }

    fn checkin(&self, data: Vec<u8>) {
        if data.len() > self.min_size.saturating_mul(RETAIN_FACTOR) {
            return;
        }
        let mut free = self.free_list();
        if free.len() < MAX_RETAINED {
            free.push(data);
        }
    }

    fn free_list(&self) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
        // A poisoned lock only means another thread panicked mid-push;
        // the free list itself is always valid.
        self.free.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// An exclusively owned, growable buffer checked out of a [`BufferPool`].
///
/// The handle moves into the operation that acquired it and returns its
/// storage to the pool on drop, on every exit path. Dereferences to the
/// full byte slab.
pub struct PooledBuffer {
    data: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl PooledBuffer {
    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Grows the buffer to at least `min_capacity` bytes, preserving the
    /// existing content and its offsets.
    ///
    /// Fails with [`BufferError::CapacityExceeded`] when `min_capacity`
    /// lies beyond the pool's configured ceiling.
    pub fn grow(&mut self, min_capacity: usize) -> Result<(), BufferError> {
        if min_capacity <= self.data.len() {
            return Ok(());
        }
        if let Some(limit) = self.pool.max_size {
            if min_capacity > limit {
                return Err(BufferError::CapacityExceeded {
                    required: min_capacity,
                    limit,
                });
            }
        }
        let mut new_size = min_capacity.max(self.data.len() * 2);
        if let Some(limit) = self.pool.max_size {
            new_size = new_size.min(limit);
        }
        let mut new_buf = vec![0u8; new_size];
        new_buf[..self.data.len()].copy_from_slice(&self.data);
        self.data = new_buf;
        Ok(())
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        self.pool.checkin(data);
    }
}
