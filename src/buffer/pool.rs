//! Packet memory pool.
//!
//! A [`MemPool`] manages a caller-provided byte arena as a ring of
//! variable-length packet records. The producer (pin sampler) reserves space,
//! writes payload bytes and commits; consumers release records in any order.
//!
//! # Ring layout
//!
//! ```text
//!  start                               last_safe        end
//!  |  rd -> [rec][rec][freed][rec] wr  |                |
//!  +-----------------------------------+----------------+
//!                                       records never start here
//! ```
//!
//! A record always starts at or below `last_safe = end - MIN_USAGE`, so its
//! link word and header are contiguous. The payload may run past the physical
//! end and continue at `start`. When a committed record ends between
//! `last_safe` and `end` without wrapping, the write position snaps back to
//! `start` and the tail is abandoned until the ring passes it again.
//!
//! # Producer path
//!
//! [`reserve`](MemPool::reserve) never fails: when less than
//! [`MIN_USAGE`] bytes are free it hands out a dummy reservation backed by a
//! small sacrificial buffer. Writes to it are discarded and
//! [`commit`](MemPool::commit) drops the frame and counts it.

use super::packet::{PacketHeader, PacketRef, PacketStage, Priority};
use crate::internal::constants::{
    DUMMY_BUFFER_SIZE, MIN_USAGE, PACKET_HEADER_BYTES, RECORD_LINK_BYTES,
};

/// Offset of the payload from the start of a record
const PAYLOAD_OFFSET: usize = RECORD_LINK_BYTES + PACKET_HEADER_BYTES;

/// Round up to the 4-byte record alignment
#[inline(always)]
const fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Bookkeeping state stored in a record's link word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
enum RecordState {
    /// Released and passed by the read position
    Empty = 0,
    /// Committed and still referenced
    Live = 1,
    /// Released out of order, waiting for the read position to reach it
    Freed = 2,
}

impl RecordState {
    const fn from_word(word: u32) -> Self {
        match word {
            1 => RecordState::Live,
            2 => RecordState::Freed,
            _ => RecordState::Empty,
        }
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// Space handed to the producer by [`MemPool::reserve`].
///
/// Not `Clone`: a reservation is consumed by exactly one
/// [`commit`](MemPool::commit).
#[derive(Debug)]
#[must_use = "a reservation must be committed"]
pub struct Reservation {
    offset: usize,
    capacity: usize,
    written: usize,
    dummy: bool,
    overflow: bool,
}

impl Reservation {
    const fn dummy() -> Self {
        Self {
            offset: 0,
            capacity: DUMMY_BUFFER_SIZE,
            written: 0,
            dummy: true,
            overflow: false,
        }
    }

    /// Whether this reservation points at the sacrificial buffer
    #[inline(always)]
    pub const fn is_dummy(&self) -> bool {
        self.dummy
    }

    /// Payload bytes that fit before the record would overrun live data
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Payload bytes written so far
    #[inline(always)]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Whether a write exceeded the capacity (the frame will be dropped)
    #[inline(always)]
    pub const fn overflowed(&self) -> bool {
        self.overflow
    }
}

// =============================================================================
// Read Cursor
// =============================================================================

/// Independent in-order read position over committed records.
///
/// The filter stage walks the pool with a cursor instead of the release
/// pointer so that packets still held by clients do not block classification
/// of newer ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadCursor {
    offset: usize,
    seq: u32,
}

impl ReadCursor {
    /// Cursor at the first record of a freshly created pool
    pub const START: Self = Self { offset: 0, seq: 0 };
}

impl Default for ReadCursor {
    fn default() -> Self {
        Self::START
    }
}

// =============================================================================
// Memory Pool
// =============================================================================

/// Ring allocator of packet records over a caller-provided arena
pub struct MemPool<'a> {
    buf: &'a mut [u8],
    len: usize,
    last_safe: usize,
    priority: Priority,
    wr: usize,
    rd: usize,
    live: usize,
    committed: u32,
    dropped: u32,
    dummy: [u8; DUMMY_BUFFER_SIZE],
}

impl<'a> MemPool<'a> {
    /// Create a pool over `buf`.
    ///
    /// The usable size is `buf.len()` rounded down to a multiple of four.
    ///
    /// # Errors
    ///
    /// [`ConfigError::PoolTooSmall`](crate::ConfigError::PoolTooSmall) if the
    /// arena cannot hold one record header plus the payload safety margin.
    pub fn new(buf: &'a mut [u8], priority: Priority) -> crate::ConfigResult<Self> {
        let len = buf.len() & !3;
        if len < MIN_USAGE {
            return Err(crate::ConfigError::PoolTooSmall);
        }
        Ok(Self {
            buf,
            len,
            last_safe: len - MIN_USAGE,
            priority,
            wr: 0,
            rd: 0,
            live: 0,
            committed: 0,
            dropped: 0,
            dummy: [0; DUMMY_BUFFER_SIZE],
        })
    }

    /// Priority class of the packets in this pool
    #[inline(always)]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Usable arena size in bytes
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.len
    }

    /// Highest offset at which a record may start
    #[inline(always)]
    pub const fn last_safe(&self) -> usize {
        self.last_safe
    }

    /// Current write position
    #[inline(always)]
    pub const fn write_offset(&self) -> usize {
        self.wr
    }

    /// Offset of the oldest record still occupying space
    #[inline(always)]
    pub const fn read_offset(&self) -> usize {
        self.rd
    }

    /// Records still occupying space, including ones freed out of order
    #[inline(always)]
    pub const fn live_count(&self) -> usize {
        self.live
    }

    /// Whether no record occupies space
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Frames dropped because the pool was full or a frame overran its space
    #[inline(always)]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Bytes between the write position and the oldest unreleased record
    #[must_use]
    pub const fn free_space(&self) -> usize {
        if self.live == 0 {
            self.len
        } else if self.rd > self.wr {
            self.rd - self.wr
        } else if self.rd == self.wr {
            0
        } else {
            (self.len - self.wr) + self.rd
        }
    }

    // =========================================================================
    // Producer
    // =========================================================================

    /// Reserve space for the next frame.
    ///
    /// Returns a dummy reservation when fewer than [`MIN_USAGE`] bytes are
    /// free; the frame written to it is dropped on commit.
    pub fn reserve(&mut self) -> Reservation {
        let space = self.free_space();
        if space < MIN_USAGE {
            return Reservation::dummy();
        }
        Reservation {
            offset: self.wr,
            capacity: space - PAYLOAD_OFFSET,
            written: 0,
            dummy: false,
            overflow: false,
        }
    }

    /// Reserve space for a frame of at least `min_size` payload bytes.
    ///
    /// Unlike [`reserve`](Self::reserve) this returns `None` when the space
    /// is not available, for callers that can retry later.
    pub fn reserve_at_least(&mut self, min_size: usize) -> Option<Reservation> {
        if !self.can_hold(min_size) {
            return None;
        }
        Some(self.reserve())
    }

    /// Whether a frame of `len` payload bytes fits in the free space,
    /// counting the record link and header
    #[must_use]
    pub const fn can_hold(&self, len: usize) -> bool {
        let needed = align4(PAYLOAD_OFFSET + len);
        let needed = if needed < MIN_USAGE { MIN_USAGE } else { needed };
        self.free_space() >= needed
    }

    /// Append payload bytes to a reservation.
    ///
    /// Returns `false` if the bytes did not all land in the pool, either
    /// because the reservation is the dummy or because it overflowed.
    pub fn write(&mut self, res: &mut Reservation, bytes: &[u8]) -> bool {
        if res.dummy {
            let start = res.written.min(DUMMY_BUFFER_SIZE);
            let n = (DUMMY_BUFFER_SIZE - start).min(bytes.len());
            self.dummy[start..start + n].copy_from_slice(&bytes[..n]);
            res.written = res.written.saturating_add(bytes.len());
            return false;
        }

        let room = res.capacity - res.written;
        let (accepted, fits) = if bytes.len() > room {
            res.overflow = true;
            (&bytes[..room], false)
        } else {
            (bytes, true)
        };
        let pos = self.wrap(res.offset + PAYLOAD_OFFSET + res.written);
        self.copy_in(pos, accepted);
        res.written += accepted.len();
        fits
    }

    /// Publish a reserved frame.
    ///
    /// `header.length` is taken from the bytes written and the stage is reset
    /// to [`PacketStage::Empty`]. Returns `None` and counts a drop for dummy
    /// or overflowed reservations.
    pub fn commit(&mut self, res: Reservation, mut header: PacketHeader) -> Option<PacketRef> {
        if res.dummy || res.overflow {
            self.dropped = self.dropped.wrapping_add(1);
            return None;
        }
        debug_assert_eq!(res.offset, self.wr, "reservation is stale");

        let total = align4(PAYLOAD_OFFSET + res.written);
        let mut end = res.offset + total;
        if end >= self.len {
            // Payload wrapped: the end lies at or below the read position,
            // which is itself a record start and hence below last_safe.
            end -= self.len;
        } else if end > self.last_safe {
            end = 0;
        }

        header.length = res.written as u32;
        header.stage = PacketStage::Empty;
        self.write_header(res.offset, &header);
        self.write_link(res.offset, end, RecordState::Live);

        self.wr = end;
        self.live += 1;
        self.committed = self.committed.wrapping_add(1);
        Some(PacketRef::new(self.priority, res.offset))
    }

    // =========================================================================
    // Consumers
    // =========================================================================

    /// Oldest record still occupying space, if any
    #[must_use]
    pub fn next_buf(&self) -> Option<PacketRef> {
        if self.live == 0 {
            return None;
        }
        Some(PacketRef::new(self.priority, self.rd))
    }

    /// Release a record.
    ///
    /// Releasing the oldest record advances the read position past it and
    /// past any newer records that were already released out of order.
    pub fn free(&mut self, pkt: PacketRef) {
        debug_assert_eq!(pkt.priority(), self.priority, "packet from another pool");
        let offset = pkt.offset();
        let state = self.record_state(offset);
        debug_assert_eq!(state, RecordState::Live, "record released twice");
        if state != RecordState::Live {
            return;
        }

        if offset != self.rd {
            self.set_record_state(offset, RecordState::Freed);
            return;
        }

        self.release_oldest();
        while self.live > 0 && self.record_state(self.rd) == RecordState::Freed {
            self.release_oldest();
        }
    }

    fn release_oldest(&mut self) {
        let rd = self.rd;
        let next = self.record_next(rd);
        debug_assert!(next < self.len, "record link out of range");
        self.set_record_state(rd, RecordState::Empty);
        self.rd = next;
        self.live -= 1;
    }

    /// Return the remaining consumer count and decrement it.
    ///
    /// A return value of 0 means the caller was the last consumer and must
    /// [`free`](Self::free) the record.
    pub fn get_and_dec_transmit_count(&mut self, pkt: PacketRef) -> u32 {
        let mut header = self.header(pkt);
        let count = header.tcount;
        if count != 0 {
            header.tcount = count - 1;
            self.set_header(pkt, &header);
        }
        count
    }

    // =========================================================================
    // Read Cursor
    // =========================================================================

    /// Cursor positioned after the last committed record
    #[must_use]
    pub const fn init_cursor(&self) -> ReadCursor {
        ReadCursor {
            offset: self.wr,
            seq: self.committed,
        }
    }

    /// Record under the cursor, if one has been committed there
    #[must_use]
    pub fn cursor_next(&self, cursor: &ReadCursor) -> Option<PacketRef> {
        if cursor.seq == self.committed {
            return None;
        }
        Some(PacketRef::new(self.priority, cursor.offset))
    }

    /// Move the cursor to the following record.
    ///
    /// Must be called before the record under the cursor is freed.
    pub fn advance_cursor(&self, cursor: &mut ReadCursor) {
        if cursor.seq == self.committed {
            return;
        }
        cursor.offset = self.record_next(cursor.offset);
        cursor.seq = cursor.seq.wrapping_add(1);
    }

    // =========================================================================
    // Record Access
    // =========================================================================

    /// Decode the header of a record
    #[must_use]
    pub fn header(&self, pkt: PacketRef) -> PacketHeader {
        let start = pkt.offset() + RECORD_LINK_BYTES;
        let mut bytes = [0u8; PacketHeader::ENCODED_LEN];
        bytes.copy_from_slice(&self.buf[start..start + PacketHeader::ENCODED_LEN]);
        PacketHeader::decode(&bytes)
    }

    /// Overwrite the header of a record
    pub fn set_header(&mut self, pkt: PacketRef, header: &PacketHeader) {
        self.write_header(pkt.offset(), header);
    }

    /// Read-modify-write the header of a record
    pub fn update_header<F>(&mut self, pkt: PacketRef, f: F)
    where
        F: FnOnce(&mut PacketHeader),
    {
        let mut header = self.header(pkt);
        f(&mut header);
        self.set_header(pkt, &header);
    }

    /// Copy payload bytes starting at `from` into `out`, following the wrap.
    ///
    /// Returns the number of bytes copied, bounded by the frame length.
    pub fn read_payload(&self, pkt: PacketRef, from: usize, out: &mut [u8]) -> usize {
        let length = self.header(pkt).length as usize;
        if from >= length {
            return 0;
        }
        let n = out.len().min(length - from);
        let pos = self.wrap(pkt.offset() + PAYLOAD_OFFSET + from);
        let first = (self.len - pos).min(n);
        out[..first].copy_from_slice(&self.buf[pos..pos + first]);
        out[first..n].copy_from_slice(&self.buf[..n - first]);
        n
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    #[inline(always)]
    const fn wrap(&self, pos: usize) -> usize {
        if pos >= self.len { pos - self.len } else { pos }
    }

    fn copy_in(&mut self, pos: usize, data: &[u8]) {
        let first = (self.len - pos).min(data.len());
        self.buf[pos..pos + first].copy_from_slice(&data[..first]);
        let rest = data.len() - first;
        self.buf[..rest].copy_from_slice(&data[first..]);
    }

    fn read_word(&self, pos: usize) -> u32 {
        let b = &self.buf[pos..pos + 4];
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    fn write_word(&mut self, pos: usize, value: u32) {
        self.buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn record_next(&self, offset: usize) -> usize {
        self.read_word(offset) as usize
    }

    fn record_state(&self, offset: usize) -> RecordState {
        RecordState::from_word(self.read_word(offset + 4))
    }

    fn set_record_state(&mut self, offset: usize, state: RecordState) {
        self.write_word(offset + 4, state as u32);
    }

    fn write_link(&mut self, offset: usize, next: usize, state: RecordState) {
        self.write_word(offset, next as u32);
        self.set_record_state(offset, state);
    }

    fn write_header(&mut self, offset: usize, header: &PacketHeader) {
        let mut bytes = [0u8; PacketHeader::ENCODED_LEN];
        header.encode(&mut bytes);
        let start = offset + RECORD_LINK_BYTES;
        self.buf[start..start + PacketHeader::ENCODED_LEN].copy_from_slice(&bytes);
    }
}

impl core::fmt::Debug for MemPool<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemPool")
            .field("len", &self.len)
            .field("priority", &self.priority)
            .field("wr", &self.wr)
            .field("rd", &self.rd)
            .field("live", &self.live)
            .field("dropped", &self.dropped)
            .finish()
    }
}

// =============================================================================
// Pool Pair
// =============================================================================

/// Low-priority pool plus the optional high-priority pool of one direction
#[derive(Debug)]
pub struct PoolPair<'a> {
    /// Best-effort pool
    pub lp: MemPool<'a>,
    /// Pool for time-sensitive traffic, if high-priority queues are enabled
    pub hp: Option<MemPool<'a>>,
}

impl<'a> PoolPair<'a> {
    /// Pair of pools; `hp` must have been created with [`Priority::High`]
    pub fn new(lp: MemPool<'a>, hp: Option<MemPool<'a>>) -> crate::ConfigResult<Self> {
        if lp.priority() != Priority::Low || hp.as_ref().is_some_and(|p| p.priority() != Priority::High) {
            return Err(crate::ConfigError::InvalidConfig);
        }
        Ok(Self { lp, hp })
    }

    /// Pair of pools matching `config`: the high-priority pool must be
    /// present exactly when high-priority queues are enabled.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidConfig`](crate::ConfigError::InvalidConfig) if
    /// the pools do not match the configuration or their priorities.
    pub fn for_config(
        config: &crate::MacConfig,
        lp: MemPool<'a>,
        hp: Option<MemPool<'a>>,
    ) -> crate::ConfigResult<Self> {
        if hp.is_some() != config.hp_queues {
            return Err(crate::ConfigError::InvalidConfig);
        }
        Self::new(lp, hp)
    }

    /// Pool holding packets of `priority`
    pub fn get(&self, priority: Priority) -> Option<&MemPool<'a>> {
        match priority {
            Priority::Low => Some(&self.lp),
            Priority::High => self.hp.as_ref(),
        }
    }

    /// Mutable pool holding packets of `priority`
    pub fn get_mut(&mut self, priority: Priority) -> Option<&mut MemPool<'a>> {
        match priority {
            Priority::Low => Some(&mut self.lp),
            Priority::High => self.hp.as_mut(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]
mod tests {
    extern crate std;
    use std::vec;
    use std::vec::Vec;

    use super::*;
    use crate::ConfigError;

    fn push(pool: &mut MemPool<'_>, payload: &[u8]) -> Option<PacketRef> {
        let mut res = pool.reserve();
        pool.write(&mut res, payload);
        pool.commit(res, PacketHeader::new(0, 0))
    }

    fn payload_of(pool: &MemPool<'_>, pkt: PacketRef) -> Vec<u8> {
        let len = pool.header(pkt).length as usize;
        let mut out = vec![0u8; len];
        let n = pool.read_payload(pkt, 0, &mut out);
        out.truncate(n);
        out
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn rejects_tiny_buffer() {
        let mut buf = [0u8; MIN_USAGE - 1];
        assert_eq!(
            MemPool::new(&mut buf, Priority::Low).err(),
            Some(ConfigError::PoolTooSmall)
        );
    }

    #[test]
    fn rounds_length_down_to_words() {
        let mut buf = [0u8; 258];
        let pool = MemPool::new(&mut buf, Priority::High).unwrap();
        assert_eq!(pool.capacity(), 256);
        assert_eq!(pool.last_safe(), 256 - MIN_USAGE);
        assert_eq!(pool.priority(), Priority::High);
        assert!(pool.is_empty());
        assert_eq!(pool.free_space(), 256);
    }

    // =========================================================================
    // Reserve / Commit
    // =========================================================================

    #[test]
    fn commit_stores_header_and_payload() {
        let mut buf = [0u8; 512];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();

        let mut res = pool.reserve();
        assert!(!res.is_dummy());
        assert!(pool.write(&mut res, &[1, 2, 3]));
        assert!(pool.write(&mut res, &[4, 5]));
        let pkt = pool
            .commit(res, PacketHeader::new(999, 1234).with_src_port(1))
            .unwrap();

        let header = pool.header(pkt);
        assert_eq!(header.length, 5);
        assert_eq!(header.timestamp, 1234);
        assert_eq!(header.src_port, 1);
        assert_eq!(header.stage, PacketStage::Empty);
        assert_eq!(payload_of(&pool, pkt), [1, 2, 3, 4, 5]);
        assert_eq!(pool.live_count(), 1);
        assert_eq!(pool.write_offset(), 8 + 36 + 8);
    }

    #[test]
    fn full_pool_hands_out_dummy() {
        let mut buf = [0u8; 256];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();

        // 104-byte records: the second one ends past last_safe and snaps to 0
        let a = push(&mut pool, &[0xAA; 60]).unwrap();
        let b = push(&mut pool, &[0xBB; 60]).unwrap();
        assert_eq!(b.offset(), 104);
        assert_eq!(pool.write_offset(), 0);
        assert_eq!(pool.free_space(), 0);

        let mut res = pool.reserve();
        assert!(res.is_dummy());
        assert!(!pool.write(&mut res, &[0xCC; 200]));
        assert!(pool.commit(res, PacketHeader::default()).is_none());
        assert_eq!(pool.dropped(), 1);

        // Existing records untouched by the dummy write
        assert_eq!(payload_of(&pool, a), [0xAA; 60]);

        pool.free(a);
        assert_eq!(pool.free_space(), 104);
        assert!(!pool.reserve().is_dummy());
    }

    #[test]
    fn overflowing_frame_is_dropped() {
        let mut buf = [0u8; 256];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();
        let _a = push(&mut pool, &[1; 120]).unwrap();

        let mut res = pool.reserve();
        let capacity = res.capacity();
        assert!(!pool.write(&mut res, &vec![2u8; capacity + 1]));
        assert!(res.overflowed());
        assert!(pool.commit(res, PacketHeader::default()).is_none());
        assert_eq!(pool.dropped(), 1);
        assert_eq!(pool.live_count(), 1);
    }

    #[test]
    fn payload_wraps_around_ring_end() {
        let mut buf = [0u8; 256];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();

        let a = push(&mut pool, &[0; 100]).unwrap();
        pool.free(a);
        // wr = 144, rd = 144; 150 payload bytes wrap past the end
        let data: Vec<u8> = (0..150u8).collect();
        let b = push(&mut pool, &data).unwrap();
        assert_eq!(b.offset(), 144);
        assert!(pool.write_offset() < b.offset());
        assert_eq!(payload_of(&pool, b), data);
    }

    #[test]
    fn reserve_at_least_refuses_short_space() {
        let mut buf = [0u8; 256];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();
        let _a = push(&mut pool, &[0; 100]).unwrap();

        assert!(pool.reserve_at_least(200).is_none());
        let res = pool.reserve_at_least(40).unwrap();
        assert!(res.capacity() >= 40);
        assert!(pool.commit(res, PacketHeader::default()).is_some());
    }

    #[test]
    fn can_hold_counts_record_overhead() {
        let mut buf = [0u8; 1540];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();

        // 1540 free bytes exceed a tagged frame but not a record holding one
        assert_eq!(pool.free_space(), 1540);
        assert!(!pool.can_hold(1514));
        assert!(pool.reserve_at_least(1514).is_none());

        let fits = 1540 - PAYLOAD_OFFSET;
        assert!(pool.can_hold(fits));
        assert!(!pool.can_hold(fits + 1));
        assert!(pool.can_hold(0));
    }

    // =========================================================================
    // Ring Safety
    // =========================================================================

    #[test]
    fn commit_end_is_below_last_safe_or_at_start() {
        let mut buf = [0u8; 1024];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();
        let mut held: std::collections::VecDeque<PacketRef> = Default::default();
        let mut seed = 12345u32;

        for _ in 0..2000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let size = 1 + (seed >> 16) as usize % 300;

            let mut res = pool.reserve();
            if res.is_dummy() || res.capacity() < size {
                if let Some(oldest) = held.pop_front() {
                    pool.free(oldest);
                }
                pool.write(&mut res, &vec![0u8; size]);
                let _ = pool.commit(res, PacketHeader::default());
                continue;
            }
            pool.write(&mut res, &vec![size as u8; size]);
            let pkt = pool.commit(res, PacketHeader::default()).unwrap();
            held.push_back(pkt);

            let wr = pool.write_offset();
            assert!(wr <= pool.last_safe() || wr == 0, "wr {wr} beyond last_safe");
            assert!(pkt.offset() <= pool.last_safe());

            if held.len() > 3 {
                let oldest = held.pop_front().unwrap();
                assert_eq!(payload_of(&pool, oldest).len(), pool.header(oldest).length as usize);
                pool.free(oldest);
            }
        }
    }

    // =========================================================================
    // Release
    // =========================================================================

    #[test]
    fn out_of_order_free_is_deferred() {
        let mut buf = [0u8; 1024];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();
        let a = push(&mut pool, &[1; 64]).unwrap();
        let b = push(&mut pool, &[2; 64]).unwrap();
        let c = push(&mut pool, &[3; 64]).unwrap();

        pool.free(b);
        assert_eq!(pool.live_count(), 3);
        assert_eq!(pool.next_buf(), Some(a));

        pool.free(a);
        assert_eq!(pool.live_count(), 1);
        assert_eq!(pool.next_buf(), Some(c));
        assert_eq!(pool.read_offset(), c.offset());

        pool.free(c);
        assert!(pool.is_empty());
        assert_eq!(pool.next_buf(), None);
        assert_eq!(pool.read_offset(), pool.write_offset());
    }

    #[test]
    fn transmit_count_reaches_zero_once() {
        let mut buf = [0u8; 512];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();
        let pkt = push(&mut pool, &[0; 60]).unwrap();
        pool.update_header(pkt, |h| h.tcount = 2);

        assert_eq!(pool.get_and_dec_transmit_count(pkt), 2);
        assert_eq!(pool.get_and_dec_transmit_count(pkt), 1);
        assert_eq!(pool.get_and_dec_transmit_count(pkt), 0);
        assert_eq!(pool.get_and_dec_transmit_count(pkt), 0);
    }

    // =========================================================================
    // Read Cursor
    // =========================================================================

    #[test]
    fn cursor_walks_committed_records_in_order() {
        let mut buf = [0u8; 1024];
        let mut pool = MemPool::new(&mut buf, Priority::High).unwrap();
        let mut cursor = pool.init_cursor();
        assert_eq!(pool.cursor_next(&cursor), None);

        let a = push(&mut pool, &[1; 60]).unwrap();
        let b = push(&mut pool, &[2; 60]).unwrap();

        assert_eq!(pool.cursor_next(&cursor), Some(a));
        pool.advance_cursor(&mut cursor);
        pool.free(a);
        assert_eq!(pool.cursor_next(&cursor), Some(b));
        pool.advance_cursor(&mut cursor);
        assert_eq!(pool.cursor_next(&cursor), None);

        // Advancing past the end is a no-op
        pool.advance_cursor(&mut cursor);
        let c = push(&mut pool, &[3; 60]).unwrap();
        assert_eq!(pool.cursor_next(&cursor), Some(c));
    }

    #[test]
    fn cursor_ignores_dropped_frames() {
        let mut buf = [0u8; 256];
        let mut pool = MemPool::new(&mut buf, Priority::Low).unwrap();
        let mut cursor = pool.init_cursor();
        let _a = push(&mut pool, &[0; 60]).unwrap();
        let _b = push(&mut pool, &[0; 60]).unwrap();
        assert!(push(&mut pool, &[0; 60]).is_none());

        assert!(pool.cursor_next(&cursor).is_some());
        pool.advance_cursor(&mut cursor);
        assert!(pool.cursor_next(&cursor).is_some());
        pool.advance_cursor(&mut cursor);
        assert!(pool.cursor_next(&cursor).is_none());
    }

    #[test]
    fn pool_pair_checks_priorities() {
        let mut a = [0u8; 256];
        let mut b = [0u8; 256];
        let lp = MemPool::new(&mut a, Priority::Low).unwrap();
        let wrong = MemPool::new(&mut b, Priority::Low).unwrap();
        assert_eq!(PoolPair::new(lp, Some(wrong)).unwrap_err(), ConfigError::InvalidConfig);

        let mut a = [0u8; 256];
        let lp = MemPool::new(&mut a, Priority::Low).unwrap();
        let mut pair = PoolPair::new(lp, None).unwrap();
        assert!(pair.get(Priority::High).is_none());
        assert_eq!(pair.get_mut(Priority::Low).map(|p| p.priority()), Some(Priority::Low));
    }

    #[test]
    fn pool_pair_follows_hp_queue_setting() {
        let lp_only = crate::MacConfig::new();
        let with_hp = crate::MacConfig::new().with_hp_queues(true);

        let mut a = [0u8; 256];
        let mut b = [0u8; 256];
        let lp = MemPool::new(&mut a, Priority::Low).unwrap();
        let hp = MemPool::new(&mut b, Priority::High).unwrap();
        assert_eq!(
            PoolPair::for_config(&lp_only, lp, Some(hp)).unwrap_err(),
            ConfigError::InvalidConfig
        );

        let mut a = [0u8; 256];
        let lp = MemPool::new(&mut a, Priority::Low).unwrap();
        assert_eq!(
            PoolPair::for_config(&with_hp, lp, None).unwrap_err(),
            ConfigError::InvalidConfig
        );

        let mut a = [0u8; 256];
        let mut b = [0u8; 256];
        let lp = MemPool::new(&mut a, Priority::Low).unwrap();
        let hp = MemPool::new(&mut b, Priority::High).unwrap();
        let pair = PoolPair::for_config(&with_hp, lp, Some(hp)).unwrap();
        assert!(pair.get(Priority::High).is_some());
    }
}
