//! Receive side: per-client state and frame dispatch.
//!
//! - [`client`] - Receive queue, EtherType filters and notification state
//! - [`dispatch`] - Classification, fan-out and client collection
//!
//! # Example
//!
//! ```ignore
//! use mii_mac::rx::RxDispatcher;
//!
//! let mut rx: RxDispatcher<4, 8> = RxDispatcher::new(config.queue_policy);
//! let reader = FILTER.reader(0).unwrap();
//!
//! // Filter task
//! rx.process_all(&mut pools, &reader, &port);
//!
//! // Client request
//! if let Some(info) = rx.get_packet(client, &mut pools, &mut buf) {
//!     handle(&buf[..info.len]);
//! }
//! ```

pub mod client;
pub mod dispatch;

pub use client::{RxClient, StatusUpdateState};
pub use dispatch::{Disposition, PacketInfo, RxDispatcher};
