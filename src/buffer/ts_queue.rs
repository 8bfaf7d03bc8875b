//! Transmit timestamp queue.
//!
//! Small FIFO that correlates the id of a timed send with the hardware
//! timestamp taken when the frame left the port.

use crate::driver::error::{QueueError, QueueResult};

/// One completed timed send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimestampEntry {
    /// Id of the requester (the transmit client index)
    pub id: u32,
    /// Egress timestamp in reference timer ticks
    pub timestamp: u32,
}

/// Bounded FIFO of [`TimestampEntry`] values
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimestampQueue<const N: usize> {
    entries: [TimestampEntry; N],
    rd: usize,
    wr: usize,
    len: usize,
}

impl<const N: usize> Default for TimestampQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TimestampQueue<N> {
    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [TimestampEntry { id: 0, timestamp: 0 }; N],
            rd: 0,
            wr: 0,
            len: 0,
        }
    }

    /// Number of queued entries
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue holds no entries
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether another entry would be refused
    #[inline(always)]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// [`QueueError::Full`] if the queue holds `N` entries; the queue is not
    /// modified.
    pub fn add_entry(&mut self, id: u32, timestamp: u32) -> QueueResult<()> {
        if self.is_full() {
            return Err(QueueError::Full);
        }
        self.entries[self.wr] = TimestampEntry { id, timestamp };
        self.wr = if self.wr + 1 == N { 0 } else { self.wr + 1 };
        self.len += 1;
        Ok(())
    }

    /// Remove and return the oldest entry
    pub fn get_entry(&mut self) -> Option<TimestampEntry> {
        if self.is_empty() {
            return None;
        }
        let entry = self.entries[self.rd];
        self.rd = if self.rd + 1 == N { 0 } else { self.rd + 1 };
        self.len -= 1;
        Some(entry)
    }

    /// Oldest entry without removing it
    #[must_use]
    pub fn peek(&self) -> Option<TimestampEntry> {
        if self.is_empty() {
            None
        } else {
            Some(self.entries[self.rd])
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::constants::DEFAULT_TIMESTAMP_QUEUE_SIZE;

    #[test]
    fn entries_come_out_in_insertion_order() {
        let mut queue: TimestampQueue<DEFAULT_TIMESTAMP_QUEUE_SIZE> = TimestampQueue::new();
        for i in 0..5 {
            queue.add_entry(i, 1000 + i).unwrap();
        }
        for i in 0..5 {
            assert_eq!(
                queue.get_entry(),
                Some(TimestampEntry {
                    id: i,
                    timestamp: 1000 + i
                })
            );
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn empty_get_does_not_mutate() {
        let mut queue: TimestampQueue<3> = TimestampQueue::new();
        assert_eq!(queue.get_entry(), None);
        assert_eq!(queue.len(), 0);

        queue.add_entry(7, 70).unwrap();
        assert_eq!(queue.get_entry().map(|e| e.id), Some(7));
        assert_eq!(queue.get_entry(), None);
        assert_eq!(queue.get_entry(), None);

        queue.add_entry(8, 80).unwrap();
        assert_eq!(queue.peek().map(|e| e.id), Some(8));
        assert_eq!(queue.get_entry().map(|e| e.timestamp), Some(80));
    }

    #[test]
    fn full_queue_rejects_without_overwriting() {
        let mut queue: TimestampQueue<3> = TimestampQueue::new();
        for i in 0..3 {
            queue.add_entry(i, i).unwrap();
        }
        assert!(queue.is_full());
        assert_eq!(queue.add_entry(99, 99), Err(QueueError::Full));
        assert_eq!(queue.get_entry().map(|e| e.id), Some(0));
    }

    #[test]
    fn wraps_non_power_of_two_capacity() {
        let mut queue: TimestampQueue<3> = TimestampQueue::new();
        for round in 0..10u32 {
            queue.add_entry(round, round * 2).unwrap();
            queue.add_entry(round + 100, 0).unwrap();
            assert_eq!(queue.get_entry().map(|e| e.id), Some(round));
            assert_eq!(queue.get_entry().map(|e| e.id), Some(round + 100));
        }
    }
}
