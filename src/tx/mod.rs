//! Transmit side: scheduling, traffic shaping and the inter-frame gap.
//!
//! - [`scheduler`] - Per-client queues and next-frame selection
//! - [`shaper`] - IEEE 802.1Qav credit-based shaper
//! - [`ifg`] - Inter-frame gap guard over a wrapping reference timer
//!
//! # Example
//!
//! ```ignore
//! use mii_mac::tx::TxScheduler;
//!
//! let mut sched: TxScheduler<4, 8, 10> = TxScheduler::new();
//! sched.send_packet(&mut tx_pool, client, &frame, true, timer.ticks())?;
//!
//! // Transmit task
//! if let Some(sel) = sched.select_next(&port, timer.ticks()) {
//!     let (start, end) = mii.send(&tx_pool, sel.pkt);
//!     sched.complete(&mut tx_pool, sel, start, end, &port);
//! }
//! ```

pub mod ifg;
pub mod scheduler;
pub mod shaper;

pub use ifg::{RefTimer, ifg_ticks, wait_for_ifg, wait_required};
pub use scheduler::{TxScheduler, TxSelection};
pub use shaper::CreditShaper;
