//! ISR-safe pool and queue wrappers using critical sections.
//!
//! The sampling context and the dispatch context only ever touch the pool
//! and queue indices for a few instructions at a time. These wrappers hold a
//! critical section for exactly that long and never across a wait.

use super::primitives::CriticalSectionCell;
use crate::buffer::{MemPool, PacketHeader, PacketQueue, PacketRef, Priority, Reservation};
use crate::buffer::{TimestampEntry, TimestampQueue};
use crate::driver::error::{ConfigError, ConfigResult, QueueResult};

// =============================================================================
// Shared Pool
// =============================================================================

/// ISR-safe memory pool over a `'static` arena.
///
/// # Example
///
/// ```ignore
/// static RX_POOL: SharedPool = SharedPool::new();
///
/// RX_POOL.init(arena, Priority::Low)?;
///
/// // Sampling context
/// let mut res = RX_POOL.reserve().unwrap();
/// RX_POOL.with(|pool| pool.write(&mut res, &bytes));
/// RX_POOL.commit(res, PacketHeader::new(0, now));
/// ```
pub struct SharedPool {
    inner: CriticalSectionCell<Option<MemPool<'static>>>,
}

impl SharedPool {
    /// Create an uninitialized pool (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(None),
        }
    }

    /// Attach the arena.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidConfig`] if the pool was already initialized
    /// - [`ConfigError::PoolTooSmall`] if the arena is too small
    pub fn init(&self, buf: &'static mut [u8], priority: Priority) -> ConfigResult<()> {
        let pool = MemPool::new(buf, priority)?;
        self.inner.with(|slot| {
            if slot.is_some() {
                return Err(ConfigError::InvalidConfig);
            }
            *slot = Some(pool);
            Ok(())
        })
    }

    /// Whether [`init`](Self::init) has been called
    pub fn is_initialized(&self) -> bool {
        self.inner.with_ref(Option::is_some)
    }

    /// Execute a closure with exclusive access to the pool.
    ///
    /// Returns `None` if the pool is not initialized.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut MemPool<'static>) -> R,
    {
        self.inner.with(|slot| slot.as_mut().map(f))
    }

    /// Reserve space for the next frame
    pub fn reserve(&self) -> Option<Reservation> {
        self.with(MemPool::reserve)
    }

    /// Publish a reserved frame
    pub fn commit(&self, res: Reservation, header: PacketHeader) -> Option<PacketRef> {
        self.with(|pool| pool.commit(res, header)).flatten()
    }

    /// Release a record
    pub fn free(&self, pkt: PacketRef) {
        self.with(|pool| pool.free(pkt));
    }

    /// Decrement the consumer count and free the record if it was the last
    pub fn release(&self, pkt: PacketRef) {
        self.with(|pool| {
            if pool.get_and_dec_transmit_count(pkt) == 0 {
                pool.free(pkt);
            }
        });
    }
}

impl Default for SharedPool {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Shared Queues
// =============================================================================

/// ISR-safe packet pointer queue
pub struct SharedQueue<const N: usize> {
    inner: CriticalSectionCell<PacketQueue<N>>,
}

impl<const N: usize> SharedQueue<N> {
    /// Create an empty queue (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(PacketQueue::new()),
        }
    }

    /// Execute a closure with exclusive access to the queue.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut PacketQueue<N>) -> R,
    {
        self.inner.with(f)
    }

    /// Append a packet
    ///
    /// # Errors
    ///
    /// [`QueueError::Full`](crate::QueueError::Full) if the write slot is occupied.
    pub fn add(&self, pkt: PacketRef) -> QueueResult<()> {
        self.inner.with(|queue| queue.add(pkt))
    }

    /// Whether the write slot is occupied
    pub fn is_full(&self) -> bool {
        self.inner.with_ref(PacketQueue::is_full)
    }

    /// Oldest packet and its slot index, without removing it
    pub fn peek(&self) -> Option<(usize, PacketRef)> {
        self.inner
            .with_ref(|queue| queue.get_next().map(|pkt| (queue.read_index(), pkt)))
    }

    /// Release a slot
    pub fn free_index(&self, index: usize) {
        self.inner.with(|queue| queue.free_index(index));
    }

    /// Remove and return the oldest packet
    pub fn pop(&self) -> Option<PacketRef> {
        self.inner.with(PacketQueue::pop)
    }
}

impl<const N: usize> Default for SharedQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// ISR-safe transmit timestamp FIFO
pub struct SharedTimestampQueue<const N: usize> {
    inner: CriticalSectionCell<TimestampQueue<N>>,
}

impl<const N: usize> SharedTimestampQueue<N> {
    /// Create an empty queue (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(TimestampQueue::new()),
        }
    }

    /// Record the egress timestamp of a timed send
    ///
    /// # Errors
    ///
    /// [`QueueError::Full`](crate::QueueError::Full) if the queue is full.
    pub fn add_entry(&self, id: u32, timestamp: u32) -> QueueResult<()> {
        self.inner.with(|queue| queue.add_entry(id, timestamp))
    }

    /// Remove the oldest entry
    pub fn get_entry(&self) -> Option<TimestampEntry> {
        self.inner.with(TimestampQueue::get_entry)
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.inner.with_ref(TimestampQueue::len)
    }

    /// Whether no entry is pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Default for SharedTimestampQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Default-sized shared pointer queue
pub type SharedQueueDefault = SharedQueue<{ crate::internal::constants::DEFAULT_NUM_PACKET_POINTERS }>;

/// Default-sized shared timestamp queue
pub type SharedTimestampQueueDefault =
    SharedTimestampQueue<{ crate::internal::constants::DEFAULT_TIMESTAMP_QUEUE_SIZE }>;
