//! Packet record layout and handles.
//!
//! A packet record in a [`MemPool`](super::MemPool) arena is laid out as
//!
//! ```text
//! +----------------+---------------------------+----------------------+
//! | link (8 bytes) | PacketHeader (36 bytes)   | payload (may wrap)   |
//! +----------------+---------------------------+----------------------+
//! ```
//!
//! The header is stored with an explicit little-endian encoding so that
//! sampling code outside the crate can rely on [`PACKET_HEADER_BYTES`].

use crate::filter::FilterResult;
use crate::internal::constants::PACKET_HEADER_BYTES;

// =============================================================================
// Priority / Handles
// =============================================================================

/// Traffic class of a pool, queue, or packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    /// Best-effort traffic
    #[default]
    Low,
    /// Time-sensitive (shaped) traffic
    High,
}

impl Priority {
    /// Map a boolean high-priority flag to a priority
    #[inline(always)]
    pub const fn from_hp(is_hp: bool) -> Self {
        if is_hp { Priority::High } else { Priority::Low }
    }

    /// Whether this is the high-priority class
    #[inline(always)]
    pub const fn is_hp(self) -> bool {
        matches!(self, Priority::High)
    }
}

/// Handle to a committed packet record inside a pool.
///
/// Handles are plain offsets tagged with the priority of the pool that owns
/// the record. They are only meaningful while the record is live; once the
/// last consumer frees it the space may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketRef {
    priority: Priority,
    offset: u32,
}

impl PacketRef {
    pub(crate) const fn new(priority: Priority, offset: usize) -> Self {
        Self {
            priority,
            offset: offset as u32,
        }
    }

    /// Priority of the owning pool
    #[inline(always)]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Byte offset of the record in the pool arena
    #[inline(always)]
    pub const fn offset(&self) -> usize {
        self.offset as usize
    }
}

// =============================================================================
// Packet Header
// =============================================================================

/// Position of a packet in the receive or transmit path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PacketStage {
    /// Committed by the producer, not yet processed
    #[default]
    Empty = 0,
    /// Classified by the filter stage
    Filtered = 1,
    /// Handed to the transmit pins
    Sent = 2,
}

impl PacketStage {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0xFF {
            1 => PacketStage::Filtered,
            2 => PacketStage::Sent,
            _ => PacketStage::Empty,
        }
    }
}

/// Flag bit in the stage word marking an 802.1Q tagged frame
const STAGE_VLAN_FLAG: u32 = 1 << 8;

/// Metadata stored in front of every packet payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketHeader {
    /// Frame length in bytes (without CRC)
    pub length: u32,
    /// Receive or transmit timestamp in reference timer ticks
    pub timestamp: u32,
    /// Clients interested in the frame and its priority class
    pub filter_result: FilterResult,
    /// Port the frame arrived on or leaves from
    pub src_port: u32,
    /// `client + 1` of a sender waiting for a transmit timestamp, 0 if none
    pub timestamp_id: u32,
    /// Processing stage
    pub stage: PacketStage,
    /// Frame carries an 802.1Q tag
    pub vlan_tagged: bool,
    /// Remaining consumers minus one
    pub tcount: u32,
    /// CRC computed by the sampling layer
    pub crc: u32,
    /// Application data attached by the MAC filter
    pub filter_data: u32,
}

impl PacketHeader {
    /// Number of bytes the header occupies in the arena
    pub const ENCODED_LEN: usize = 9 * 4;

    /// Header for a frame of `length` bytes received at `timestamp`
    #[must_use]
    pub const fn new(length: u32, timestamp: u32) -> Self {
        Self {
            length,
            timestamp,
            filter_result: FilterResult::NONE,
            src_port: 0,
            timestamp_id: 0,
            stage: PacketStage::Empty,
            vlan_tagged: false,
            tcount: 0,
            crc: 0,
            filter_data: 0,
        }
    }

    /// Set the source port
    #[must_use]
    pub const fn with_src_port(mut self, port: u32) -> Self {
        self.src_port = port;
        self
    }

    /// Set the CRC word
    #[must_use]
    pub const fn with_crc(mut self, crc: u32) -> Self {
        self.crc = crc;
        self
    }

    /// Serialize into the arena representation
    pub fn encode(&self, out: &mut [u8; Self::ENCODED_LEN]) {
        let stage = self.stage as u32 | if self.vlan_tagged { STAGE_VLAN_FLAG } else { 0 };
        let words = [
            self.length,
            self.timestamp,
            self.filter_result.bits(),
            self.src_port,
            self.timestamp_id,
            stage,
            self.tcount,
            self.crc,
            self.filter_data,
        ];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }

    /// Deserialize from the arena representation
    #[must_use]
    pub fn decode(bytes: &[u8; Self::ENCODED_LEN]) -> Self {
        let mut words = [0u32; Self::ENCODED_LEN / 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self {
            length: words[0],
            timestamp: words[1],
            filter_result: FilterResult::from_bits(words[2]),
            src_port: words[3],
            timestamp_id: words[4],
            stage: PacketStage::from_bits(words[5]),
            vlan_tagged: words[5] & STAGE_VLAN_FLAG != 0,
            tcount: words[6],
            crc: words[7],
            filter_data: words[8],
        }
    }
}

// Sampling code writes payload at a fixed offset; keep the two in lockstep.
const _: () = assert!(PacketHeader::ENCODED_LEN == PACKET_HEADER_BYTES);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_matches_constant() {
        assert_eq!(PacketHeader::ENCODED_LEN, PACKET_HEADER_BYTES);
        assert_eq!(PACKET_HEADER_BYTES % 4, 0);
    }

    #[test]
    fn header_field_offsets_are_fixed() {
        let mut header = PacketHeader::new(0x0102_0304, 0xAABB_CCDD).with_src_port(1);
        header.stage = PacketStage::Filtered;
        header.vlan_tagged = true;
        header.filter_data = 0x5555_AAAA;

        let mut bytes = [0u8; PacketHeader::ENCODED_LEN];
        header.encode(&mut bytes);

        // length at 0, timestamp at 4, src_port at 12, stage word at 20
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[4..8], &[0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(&bytes[12..16], &[1, 0, 0, 0]);
        assert_eq!(&bytes[20..24], &[1, 1, 0, 0]);
        assert_eq!(&bytes[32..36], &[0xAA, 0xAA, 0x55, 0x55]);
    }

    #[test]
    fn header_decode_restores_flags() {
        let mut header = PacketHeader::new(64, 7);
        header.filter_result = FilterResult::for_client(3).unwrap().with_hp(true);
        header.stage = PacketStage::Sent;
        header.vlan_tagged = true;
        header.tcount = 2;

        let mut bytes = [0u8; PacketHeader::ENCODED_LEN];
        header.encode(&mut bytes);
        assert_eq!(PacketHeader::decode(&bytes), header);
    }

    #[test]
    fn stage_decoding_ignores_unknown_bits() {
        assert_eq!(PacketStage::from_bits(0xFF00), PacketStage::Empty);
        assert_eq!(PacketStage::from_bits(STAGE_VLAN_FLAG | 2), PacketStage::Sent);
    }

    #[test]
    fn priority_helpers() {
        assert_eq!(Priority::from_hp(true), Priority::High);
        assert_eq!(Priority::from_hp(false), Priority::Low);
        assert!(Priority::High.is_hp());
        assert!(!Priority::Low.is_hp());
    }
}
