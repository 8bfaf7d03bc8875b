//! External Stack Integrations
//!
//! This module provides integrations with external libraries:
//!
//! - **smoltcp** (`smoltcp`): Integration with the smoltcp TCP/IP network stack
//!   - Implements `smoltcp::phy::Device` over one receive and one transmit client
//!   - Conversions between [`MacAddress`](crate::MacAddress) and `EthernetAddress`
//!   - Requires `smoltcp` feature
//!
//! # Example
//!
//! ```ignore
//! use smoltcp::phy::Device;
//! use mii_mac::integration::MacDevice;
//!
//! let mut device = MacDevice::new(&mut rx, &mut rx_pools, &mut sched, &mut tx_pool, 0, 0);
//! let (rx_token, tx_token) = device.receive(Instant::ZERO).unwrap();
//! ```

#[cfg(feature = "smoltcp")]
pub mod smoltcp;

#[cfg(feature = "smoltcp")]
pub use smoltcp::{MacDevice, MacRxToken, MacTxToken, ethernet_address};
