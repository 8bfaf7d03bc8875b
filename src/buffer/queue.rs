//! Packet pointer queue.
//!
//! A bounded ring of [`PacketRef`] handles used to pass packets between
//! pipeline stages without copying payload. An empty slot is `None`; the
//! queue is full exactly when the slot at the write index is occupied.
//! Slots may be released out of order, and the read index skips the holes
//! once the oldest slot is released.

use super::packet::PacketRef;
use crate::driver::error::{QueueError, QueueResult};

/// Bounded pointer queue with out-of-order release.
///
/// `N` must be a power of two.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketQueue<const N: usize> {
    slots: [Option<PacketRef>; N],
    rd: usize,
    wr: usize,
}

impl<const N: usize> Default for PacketQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PacketQueue<N> {
    const MASK: usize = {
        assert!(N.is_power_of_two(), "queue size must be a power of two");
        N - 1
    };

    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        let _ = Self::MASK;
        Self {
            slots: [None; N],
            rd: 0,
            wr: 0,
        }
    }

    /// Clear all slots and reset both indices
    pub fn init(&mut self) {
        self.slots = [None; N];
        self.rd = 0;
        self.wr = 0;
    }

    /// Number of slots
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether the slot at the write index is occupied
    #[inline(always)]
    pub const fn is_full(&self) -> bool {
        self.slots[self.wr].is_some()
    }

    /// Whether the slot at the read index is empty
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.slots[self.rd].is_none()
    }

    /// Number of occupied slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Store a packet at the write index.
    ///
    /// # Errors
    ///
    /// [`QueueError::Full`] if the slot at the write index is still occupied.
    pub fn add(&mut self, pkt: PacketRef) -> QueueResult<()> {
        if self.is_full() {
            return Err(QueueError::Full);
        }
        self.slots[self.wr] = Some(pkt);
        self.wr = (self.wr + 1) & Self::MASK;
        Ok(())
    }

    /// Packet at the read index, without consuming it
    #[inline]
    pub const fn get_next(&self) -> Option<PacketRef> {
        self.slots[self.rd]
    }

    /// Current read index, for use with [`free_index`](Self::free_index)
    #[inline(always)]
    pub const fn read_index(&self) -> usize {
        self.rd
    }

    /// Packet stored at an arbitrary index
    #[inline]
    pub const fn get(&self, index: usize) -> Option<PacketRef> {
        self.slots[index & Self::MASK]
    }

    /// Release a slot.
    ///
    /// Releasing the slot at the read index advances the read index past
    /// every slot that was already released, stopping at a live slot or at
    /// the write index.
    pub fn free_index(&mut self, index: usize) {
        let index = index & Self::MASK;
        debug_assert!(self.slots[index].is_some(), "queue slot released twice");
        self.slots[index] = None;

        if index == self.rd {
            self.rd = (self.rd + 1) & Self::MASK;
            while self.rd != self.wr && self.slots[self.rd].is_none() {
                self.rd = (self.rd + 1) & Self::MASK;
            }
        }
    }

    /// Remove and return the packet at the read index
    pub fn pop(&mut self) -> Option<PacketRef> {
        let pkt = self.get_next()?;
        self.free_index(self.rd);
        Some(pkt)
    }

    /// Iterate over occupied slots in queue order as `(index, packet)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, PacketRef)> + '_ {
        let occupied = if self.is_full() {
            N
        } else {
            self.wr.wrapping_sub(self.rd) & Self::MASK
        };
        (0..occupied)
            .map(move |i| (self.rd + i) & Self::MASK)
            .filter_map(move |i| self.slots[i].map(|pkt| (i, pkt)))
    }
}

// =============================================================================
// Tests
// =============================================================================
