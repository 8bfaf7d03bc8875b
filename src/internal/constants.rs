//! Centralized Constants
//!
//! This module provides a single source of truth for the magic numbers used
//! throughout the buffering core.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Frame sizes**: Ethernet frame dimensions
//! - **Packet record layout**: arena header sizes and the pool safety margin
//! - **Queue and table sizing**: defaults for the const-generic sizes
//! - **MAC filter hashing**: polynomials and rebuild parameters
//! - **Traffic shaping**: credit fixed-point format and wire overhead
//! - **Timing**: reference timer and inter-frame gap

// =============================================================================
// Frame Sizes
// =============================================================================

/// Maximum Ethernet frame size without VLAN tag (1500 + 14 header + 4 CRC)
pub const MAX_PACKET_SIZE: usize = 1518;

/// Maximum Ethernet frame size including a VLAN tag
pub const MAX_TAGGED_PACKET_SIZE: usize = MAX_PACKET_SIZE + VLAN_TAG_SIZE;

/// Minimum Ethernet frame size (excluding CRC)
pub const MIN_FRAME_SIZE: usize = 60;

/// Ethernet header size (dst MAC + src MAC + EtherType)
pub const ETH_HEADER_SIZE: usize = 14;

/// Offset of the EtherType field in an untagged frame
pub const ETHERTYPE_OFFSET: usize = 12;

/// 802.1Q VLAN tag size
pub const VLAN_TAG_SIZE: usize = 4;

/// 802.1Q tag protocol identifier
pub const ETHERTYPE_VLAN: u16 = 0x8100;

/// CRC/FCS size at end of frame
pub const CRC_SIZE: usize = 4;

/// Standard Ethernet MTU (payload bytes)
pub const MTU: usize = 1500;

/// MAC address length in bytes
pub const MAC_ADDR_LEN: usize = 6;

// =============================================================================
// Packet Record Layout
// =============================================================================

/// Bytes of ring bookkeeping in front of each packet record (next link + state)
pub const RECORD_LINK_BYTES: usize = 8;

/// Number of bytes in a packet record before the payload.
///
/// Low-level sampling code writes payload at this offset; the encoded
/// [`PacketHeader`](crate::buffer::PacketHeader) is checked against it at
/// compile time.
pub const PACKET_HEADER_BYTES: usize = 36;

/// Payload slack that must follow a record header before the ring end.
pub const MIN_PAYLOAD_SLACK: usize = 4 * 10;

/// Smallest free region the pool will hand to the producer.
///
/// Also the distance from the physical ring end inside which a new record
/// may not start.
pub const MIN_USAGE: usize = RECORD_LINK_BYTES + PACKET_HEADER_BYTES + MIN_PAYLOAD_SLACK;

/// Size of the sacrificial buffer that absorbs frames when the pool is full
pub const DUMMY_BUFFER_SIZE: usize = MIN_USAGE;

// =============================================================================
// Queue and Table Sizing
// =============================================================================

/// Default number of packet pointers per queue (power of two)
pub const DEFAULT_NUM_PACKET_POINTERS: usize = 32;

/// Default receive queue depth per client (power of two)
pub const DEFAULT_RX_CLIENT_QUEUE_SIZE: usize = 4;

/// Default MAC filter hash table size (power of two)
pub const DEFAULT_HASH_TABLE_SIZE: usize = 256;

/// Default depth of the transmit timestamp queue
pub const DEFAULT_TIMESTAMP_QUEUE_SIZE: usize = 10;

/// Maximum EtherType filters per receive client
pub const MAX_ETHERTYPE_FILTERS: usize = 2;

/// Maximum number of clients addressable by a filter result bitmask
pub const MAX_FILTER_CLIENTS: usize = 31;

/// Maximum number of concurrent filter threads reading the hash table
pub const MAX_FILTER_THREADS: usize = 2;

// =============================================================================
// MAC Filter Hashing
// =============================================================================

/// Initial polynomial for the first hash function
pub const HASH_POLY_0: u32 = 0xEDB8_8320;

/// Initial polynomial for the second hash function
pub const HASH_POLY_1: u32 = 0xBA75_FE21;

/// LCG multiplier used to perturb the polynomials on a rebuild
pub const POLY_LCG_A: u32 = 1_664_525;

/// LCG increment used to perturb the polynomials on a rebuild
pub const POLY_LCG_C: u32 = 1_013_904_223;

/// Extra displacement steps allowed on top of the live entry count
pub const INSERT_CHAIN_MARGIN: usize = 10;

/// Rebuild attempts with fresh polynomials before reporting a full table
pub const MAX_REHASH_ATTEMPTS: usize = 64;

/// Spin iterations the writer waits for each filter thread to pick up a swap
pub const SWAP_ACK_RETRIES: u32 = 100;

// =============================================================================
// Traffic Shaping (IEEE 802.1Qav)
// =============================================================================

/// Fractional bits of the fixed-point credit format
pub const CREDIT_FRACTIONAL_BITS: u32 = 16;

/// Preamble + SFD bytes on the wire
pub const PREAMBLE_BYTES: usize = 8;

/// Inter-frame gap in bytes (96 bit times)
pub const IFG_BYTES: usize = 96 / 8;

/// Per-frame wire overhead added to the payload length by the send slope
pub const WIRE_OVERHEAD_BYTES: usize = PREAMBLE_BYTES + IFG_BYTES + CRC_SIZE;

// =============================================================================
// Timing
// =============================================================================

/// Default reference timer frequency (100 MHz)
pub const DEFAULT_TIMER_HZ: u32 = 100_000_000;

/// Inter-frame gap in bit times
pub const IFG_BIT_TIMES: u32 = 96;
