//! MII Ethernet MAC Buffering Core
//!
//! A `no_std`, `no_alloc` implementation of the packet buffering and dispatch
//! core of a software Ethernet MAC: the layer between a pin-sampling (or DMA)
//! producer and the client tasks that send and receive frames.
//!
//! # Architecture
//!
//! The core is organized leaf-first:
//!
//! 1. **Packet storage** ([`buffer`]): Ring allocator of packet records,
//!    pointer queues with out-of-order release, transmit timestamp FIFO
//! 2. **Address filter** ([`filter`]): Two-choice hash table with cuckoo
//!    displacement, double-buffered so lookups never wait on an update
//! 3. **Receive path** ([`rx`]): Classification, EtherType filtering and
//!    zero-copy fan-out to client queues
//! 4. **Transmit path** ([`tx`]): Per-client queues, IEEE 802.1Qav credit
//!    shaper and the inter-frame gap guard
//!
//! Shared settings (link state, shaper slope, timestamp latencies) live in
//! [`driver`].
//!
//! ## Data Flow
//!
//! ```text
//!  sampler --reserve/commit--> MemPool --cursor--> RxDispatcher --lookup--> MacAddrFilter
//!                                                      |
//!                                              client queues --get_packet--> client
//!
//!  client --send_packet--> TxScheduler --select_next (shaper, IFG)--> pin driver
//!                               ^                                         |
//!                               +---------------complete------------------+
//! ```
//!
//! ## Real-time Guarantees
//!
//! - The producer never blocks: a full pool hands out a dummy reservation and
//!   the frame is dropped and counted.
//! - Filter lookups run against a published table and never wait for the
//!   control path.
//! - Nothing on the receive hot path logs.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types and control-path logs
//! - `log`: Log control-path events through the `log` facade (ignored when
//!   `defmt` is enabled)
//! - `smoltcp`: Enable smoltcp network stack integration
//! - `critical-section`: Enable ISR-safe `SharedPool`/`SharedQueue` wrappers
//!
//! # Example
//!
//! ```ignore
//! use mii_mac::{MacAddrFilter, MacAddress, MacFilterEntry, MemPool, PoolPair, Priority};
//! use mii_mac::{PortState, RxDispatcher, QueuePolicy};
//!
//! static FILTER: MacAddrFilter<256> = MacAddrFilter::new();
//!
//! let mut pools = PoolPair::new(MemPool::new(&mut RX_ARENA, Priority::Low)?, None)?;
//! let mut rx: RxDispatcher<4, 8> = RxDispatcher::new(QueuePolicy::LowPriorityFirst);
//! let port = PortState::new();
//!
//! FILTER
//!     .writer()
//!     .unwrap()
//!     .add_entry(0, false, &MacFilterEntry::new(MacAddress(STATION)))?;
//!
//! // Sampling context
//! let mut res = pools.lp.reserve();
//! pools.lp.write(&mut res, &frame);
//! pools.lp.commit(res, PacketHeader::new(0, timestamp));
//!
//! // Filter context
//! let reader = FILTER.reader(0).unwrap();
//! rx.process_all(&mut pools, &reader, &port);
//!
//! // Client 0
//! let info = rx.get_packet(0, &mut pools, &mut buf);
//! ```

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels mirror the [lints] tables in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod buffer;
pub mod driver;
pub mod filter;
pub mod rx;
pub mod tx;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "smoltcp")]
#[cfg_attr(docsrs, doc(cfg(feature = "smoltcp")))]
pub mod integration;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use buffer::{
    MemPool, PacketHeader, PacketQueue, PacketRef, PacketStage, PoolPair, Priority, ReadCursor,
    Reservation, TimestampEntry, TimestampQueue,
};
pub use driver::config::{LinkState, MacConfig, QueuePolicy, Speed};
pub use driver::error::{
    ConfigError, ConfigResult, Error, FilterError, FilterOpResult, QueueError, QueueResult, Result,
};
pub use driver::port::PortState;
pub use filter::{
    AddressLookup, FilterKey, FilterReader, FilterResult, FilterWriter, HashTable, MacAddrFilter,
    MacAddress, MacFilterEntry,
};
pub use rx::{Disposition, PacketInfo, RxClient, RxDispatcher, StatusUpdateState};
pub use tx::{CreditShaper, RefTimer, TxScheduler, TxSelection};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::{SharedPool, SharedQueue, SharedTimestampQueue};

/// Shared buffering constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on the core types.
pub mod constants {
    pub use crate::internal::constants::{
        // Shaping
        CREDIT_FRACTIONAL_BITS,
        // Frame sizes
        CRC_SIZE,
        // Sizing defaults
        DEFAULT_HASH_TABLE_SIZE,
        DEFAULT_NUM_PACKET_POINTERS,
        DEFAULT_RX_CLIENT_QUEUE_SIZE,
        // Timing
        DEFAULT_TIMER_HZ,
        DEFAULT_TIMESTAMP_QUEUE_SIZE,
        ETH_HEADER_SIZE,
        ETHERTYPE_VLAN,
        IFG_BIT_TIMES,
        MAC_ADDR_LEN,
        MAX_ETHERTYPE_FILTERS,
        MAX_FILTER_CLIENTS,
        MAX_FILTER_THREADS,
        MAX_PACKET_SIZE,
        MAX_TAGGED_PACKET_SIZE,
        MIN_FRAME_SIZE,
        // Record layout
        MIN_USAGE,
        MTU,
        PACKET_HEADER_BYTES,
        VLAN_TAG_SIZE,
        WIRE_OVERHEAD_BYTES,
    };
}
