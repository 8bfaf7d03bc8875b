//! Synchronization and Concurrency Support
//!
//! Critical-section wrappers standing in for the hardware lock that guards
//! the brief pool and queue index updates between the sampling, filter and
//! client contexts:
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`] - ISR-safe
//!   interior mutability
//! - **Shared Wrappers** (`shared`): [`SharedPool`], [`SharedQueue`] and
//!   [`SharedTimestampQueue`]
//!
//! The MAC filter does not use these; its tables are swapped with atomics
//! (see [`MacAddrFilter`](crate::filter::MacAddrFilter)).
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables this module
//!
//! # Example
//!
//! ```ignore
//! use mii_mac::sync::{SharedPool, SharedQueue};
//!
//! static RX_POOL: SharedPool = SharedPool::new();
//! static CLIENT_QUEUE: SharedQueue<8> = SharedQueue::new();
//!
//! #[interrupt]
//! fn RX_DONE() {
//!     if let Some(pkt) = RX_POOL.commit(res, header) {
//!         CLIENT_QUEUE.add(pkt).ok();
//!     }
//! }
//! ```

mod primitives;

pub use primitives::CriticalSectionCell;

mod shared;

pub use shared::{
    SharedPool, SharedQueue, SharedQueueDefault, SharedTimestampQueue, SharedTimestampQueueDefault,
};
