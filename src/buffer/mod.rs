//! Packet storage: the record arena, pointer queues and timestamp FIFO.
//!
//! - [`packet`] - Record header layout and [`PacketRef`] handles
//! - [`pool`] - Ring allocator of packet records ([`MemPool`])
//! - [`queue`] - Pointer queue with out-of-order release ([`PacketQueue`])
//! - [`ts_queue`] - Transmit timestamp FIFO ([`TimestampQueue`])
//!
//! # Example
//!
//! ```ignore
//! use mii_mac::buffer::{MemPool, PacketHeader, PacketQueue, Priority};
//!
//! let mut arena = [0u8; 4096];
//! let mut pool = MemPool::new(&mut arena, Priority::Low)?;
//! let mut queue: PacketQueue<8> = PacketQueue::new();
//!
//! let mut res = pool.reserve();
//! pool.write(&mut res, &frame);
//! if let Some(pkt) = pool.commit(res, PacketHeader::new(0, now)) {
//!     queue.add(pkt)?;
//! }
//! ```

pub mod packet;
pub mod pool;
pub mod queue;
pub mod ts_queue;

pub use packet::{PacketHeader, PacketRef, PacketStage, Priority};
pub use pool::{MemPool, PoolPair, ReadCursor, Reservation};
pub use queue::PacketQueue;
pub use ts_queue::{TimestampEntry, TimestampQueue};
