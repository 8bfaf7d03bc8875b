//! smoltcp Network Stack Integration
//!
//! [`MacDevice`] binds one receive client and one transmit client of the
//! buffering core to a [smoltcp](https://docs.rs/smoltcp) interface. Frames
//! are collected through [`RxDispatcher::get_packet`] and sent through
//! [`TxScheduler::send_packet`], so the shaper, the EtherType filters and
//! VLAN stripping apply as for any other client.
//!
//! # Example
//!
//! ```ignore
//! use smoltcp::iface::{Config, Interface, SocketSet};
//! use mii_mac::integration::smoltcp::MacDevice;
//!
//! let mut device = MacDevice::new(&mut rx, &mut rx_pools, &mut sched, &mut tx_pool, 0, 0);
//! device.set_now(timer.ticks());
//!
//! let config = Config::new(ethernet_address(STATION).into());
//! let mut iface = Interface::new(config, &mut device, Instant::ZERO);
//! iface.poll(Instant::ZERO, &mut device, &mut sockets);
//! ```
//!
//! # Borrowing
//!
//! The device holds disjoint mutable borrows of the receive and transmit
//! state, so [`Device::receive`] can hand out both tokens at once without
//! aliasing.

use smoltcp::phy::{Device, DeviceCapabilities, Medium};
use smoltcp::time::Instant;

use crate::buffer::{MemPool, PoolPair};
use crate::filter::MacAddress;
use crate::internal::constants::{ETH_HEADER_SIZE, MAX_TAGGED_PACKET_SIZE, MTU};
use crate::rx::RxDispatcher;
use crate::tx::TxScheduler;

// =============================================================================
// Address Conversions
// =============================================================================

impl From<smoltcp::wire::EthernetAddress> for MacAddress {
    fn from(addr: smoltcp::wire::EthernetAddress) -> Self {
        MacAddress(addr.0)
    }
}

impl From<MacAddress> for smoltcp::wire::EthernetAddress {
    fn from(addr: MacAddress) -> Self {
        smoltcp::wire::EthernetAddress(addr.0)
    }
}

/// Get a station address as a smoltcp `EthernetAddress`
pub fn ethernet_address(addr: impl Into<MacAddress>) -> smoltcp::wire::EthernetAddress {
    addr.into().into()
}

// =============================================================================
// RX Token
// =============================================================================

/// Receive token for smoltcp
pub struct MacRxToken<'t, 'a, const CLIENTS: usize, const Q: usize> {
    rx: &'t mut RxDispatcher<CLIENTS, Q>,
    pools: &'t mut PoolPair<'a>,
    client: usize,
}

impl<const CLIENTS: usize, const Q: usize> smoltcp::phy::RxToken for MacRxToken<'_, '_, CLIENTS, Q> {
    fn consume<R, F>(self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        let mut buffer = [0u8; MAX_TAGGED_PACKET_SIZE];
        let len = self
            .rx
            .get_packet(self.client, self.pools, &mut buffer)
            .map_or(0, |info| info.len);
        f(&buffer[..len])
    }
}

// =============================================================================
// TX Token
// =============================================================================

/// Transmit token for smoltcp
pub struct MacTxToken<'t, 'a, const CLIENTS: usize, const TQ: usize, const TS: usize> {
    sched: &'t mut TxScheduler<CLIENTS, TQ, TS>,
    pool: &'t mut MemPool<'a>,
    client: usize,
    now: u32,
}

impl<const CLIENTS: usize, const TQ: usize, const TS: usize> smoltcp::phy::TxToken
    for MacTxToken<'_, '_, CLIENTS, TQ, TS>
{
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let len = len.min(MAX_TAGGED_PACKET_SIZE);
        let mut buffer = [0u8; MAX_TAGGED_PACKET_SIZE];
        let result = f(&mut buffer[..len]);

        // A full queue or pool drops the frame; smoltcp retransmits as needed
        let _ = self
            .sched
            .send_packet(self.pool, self.client, &buffer[..len], false, self.now);
        result
    }
}

// =============================================================================
// Device
// =============================================================================

/// smoltcp device over one receive and one transmit client
pub struct MacDevice<'t, 'a, const CLIENTS: usize, const Q: usize, const TQ: usize, const TS: usize> {
    rx: &'t mut RxDispatcher<CLIENTS, Q>,
    rx_pools: &'t mut PoolPair<'a>,
    sched: &'t mut TxScheduler<CLIENTS, TQ, TS>,
    tx_pool: &'t mut MemPool<'a>,
    rx_client: usize,
    tx_client: usize,
    now: u32,
}

impl<'t, 'a, const CLIENTS: usize, const Q: usize, const TQ: usize, const TS: usize>
    MacDevice<'t, 'a, CLIENTS, Q, TQ, TS>
{
    /// Bind a device to receive client `rx_client` and transmit client
    /// `tx_client`
    pub fn new(
        rx: &'t mut RxDispatcher<CLIENTS, Q>,
        rx_pools: &'t mut PoolPair<'a>,
        sched: &'t mut TxScheduler<CLIENTS, TQ, TS>,
        tx_pool: &'t mut MemPool<'a>,
        rx_client: usize,
        tx_client: usize,
    ) -> Self {
        Self {
            rx,
            rx_pools,
            sched,
            tx_pool,
            rx_client,
            tx_client,
            now: 0,
        }
    }

    /// Reference timer value stamped on frames sent from now on
    pub fn set_now(&mut self, now: u32) {
        self.now = now;
    }

    fn tx_ready(&self) -> bool {
        self.sched.can_send(self.tx_client, self.tx_pool.priority())
            && self.tx_pool.can_hold(MTU + ETH_HEADER_SIZE)
    }

    fn tx_token(&mut self) -> MacTxToken<'_, 'a, CLIENTS, TQ, TS> {
        MacTxToken {
            sched: &mut *self.sched,
            pool: &mut *self.tx_pool,
            client: self.tx_client,
            now: self.now,
        }
    }
}

impl<'a, const CLIENTS: usize, const Q: usize, const TQ: usize, const TS: usize> Device
    for MacDevice<'_, 'a, CLIENTS, Q, TQ, TS>
{
    type RxToken<'b>
        = MacRxToken<'b, 'a, CLIENTS, Q>
    where
        Self: 'b;
    type TxToken<'b>
        = MacTxToken<'b, 'a, CLIENTS, TQ, TS>
    where
        Self: 'b;

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        if !self.rx.client(self.rx_client)?.packet_ready() || !self.tx_ready() {
            return None;
        }
        let rx = MacRxToken {
            rx: &mut *self.rx,
            pools: &mut *self.rx_pools,
            client: self.rx_client,
        };
        let tx = MacTxToken {
            sched: &mut *self.sched,
            pool: &mut *self.tx_pool,
            client: self.tx_client,
            now: self.now,
        };
        Some((rx, tx))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        if !self.tx_ready() {
            return None;
        }
        Some(self.tx_token())
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.medium = Medium::Ethernet;
        caps.max_transmission_unit = MTU + ETH_HEADER_SIZE;
        caps.max_burst_size = Some(1);
        caps
    }
}
