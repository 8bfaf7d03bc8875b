//! Receive filtering and dispatch.
//!
//! The filter task calls [`RxDispatcher::process`] for every frame the
//! producer committed. Each frame is classified by its destination address
//! (and VLAN id when tagged), narrowed by the clients' EtherType filters and
//! queued to every interested client without copying. The pool record keeps
//! a transmit count so that it is released by whichever client collects it
//! last through [`RxDispatcher::get_packet`].

use super::client::RxClient;
use crate::buffer::{PacketRef, PacketStage, PoolPair, Priority, ReadCursor};
use crate::driver::config::{LinkState, QueuePolicy, Speed};
use crate::driver::error::{ConfigError, ConfigResult};
use crate::driver::port::PortState;
use crate::filter::{AddressLookup, FilterKey, FilterResult, MacAddress};
use crate::internal::constants::{
    ETH_HEADER_SIZE, ETHERTYPE_OFFSET, ETHERTYPE_VLAN, MAX_TAGGED_PACKET_SIZE, VLAN_TAG_SIZE,
};

/// Outcome of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposition {
    /// Queued to this many clients
    Delivered(u32),
    /// No address match, or every match was filtered out by EtherType
    NoMatch,
    /// Length outside the valid frame range
    BadLength,
    /// Every interested client queue was full
    QueuesFull,
}

/// Metadata of a frame handed to a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketInfo {
    /// Bytes copied into the caller's buffer
    pub len: usize,
    /// Ingress timestamp, corrected by the port's ingress latency
    pub timestamp: u32,
    /// Port the frame arrived on
    pub src_port: u32,
    /// Application data of the matching filter entry
    pub filter_data: u32,
}

/// Fields of the Ethernet header needed for classification
struct FrameInfo {
    dst: MacAddress,
    ethertype: u16,
    vlan: Option<u16>,
}

impl FrameInfo {
    fn parse(bytes: &[u8; ETH_HEADER_SIZE + VLAN_TAG_SIZE], len: usize) -> Option<Self> {
        let dst = MacAddress::from_frame(bytes)?;
        let tpid = u16::from_be_bytes([bytes[ETHERTYPE_OFFSET], bytes[ETHERTYPE_OFFSET + 1]]);
        if tpid != ETHERTYPE_VLAN {
            return Some(Self {
                dst,
                ethertype: tpid,
                vlan: None,
            });
        }
        if len < ETH_HEADER_SIZE + VLAN_TAG_SIZE {
            return None;
        }
        let tci = u16::from_be_bytes([bytes[14], bytes[15]]);
        Some(Self {
            dst,
            ethertype: u16::from_be_bytes([bytes[16], bytes[17]]),
            vlan: Some(tci & 0x0FFF),
        })
    }
}

/// Receive side of one MAC instance
#[derive(Debug)]
pub struct RxDispatcher<const CLIENTS: usize, const Q: usize> {
    clients: [RxClient<Q>; CLIENTS],
    cursors: [ReadCursor; 2],
    policy: QueuePolicy,
    rejected: u32,
}

impl<const CLIENTS: usize, const Q: usize> Default for RxDispatcher<CLIENTS, Q> {
    fn default() -> Self {
        Self::new(QueuePolicy::LowPriorityFirst)
    }
}

impl<const CLIENTS: usize, const Q: usize> RxDispatcher<CLIENTS, Q> {
    /// Dispatcher for freshly created pools
    #[must_use]
    pub const fn new(policy: QueuePolicy) -> Self {
        Self {
            clients: [const { RxClient::new() }; CLIENTS],
            cursors: [ReadCursor::START; 2],
            policy,
            rejected: 0,
        }
    }

    /// Position the read cursors after everything already in `pools`
    pub fn attach(&mut self, pools: &PoolPair<'_>) {
        self.cursors[Priority::Low as usize] = pools.lp.init_cursor();
        if let Some(hp) = &pools.hp {
            self.cursors[Priority::High as usize] = hp.init_cursor();
        }
    }

    /// Order in which pending low- and high-priority frames are processed
    #[inline(always)]
    pub const fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// Change the processing order
    pub fn set_policy(&mut self, policy: QueuePolicy) {
        self.policy = policy;
    }

    /// Frames released without delivery
    #[inline(always)]
    pub const fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Client state
    pub fn client(&self, client: usize) -> Option<&RxClient<Q>> {
        self.clients.get(client)
    }

    /// Mutable client state
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidClient`] for an unknown client.
    pub fn client_mut(&mut self, client: usize) -> ConfigResult<&mut RxClient<Q>> {
        self.clients.get_mut(client).ok_or(ConfigError::InvalidClient)
    }

    /// Update the port link and flag a notification for every client
    /// waiting for one. Returns whether the link changed.
    pub fn set_link_state(&mut self, port: &mut PortState, state: LinkState, speed: Speed) -> bool {
        let changed = port.set_link_state(state, speed);
        if changed {
            self.clients.iter_mut().for_each(RxClient::link_status_changed);
        }
        changed
    }

    fn pending(&self, pools: &PoolPair<'_>, priority: Priority) -> Option<PacketRef> {
        pools
            .get(priority)?
            .cursor_next(&self.cursors[priority as usize])
    }

    /// Classify and queue the next unfiltered frame.
    ///
    /// Returns `None` if no frame is pending in either pool.
    pub fn process<L: AddressLookup>(
        &mut self,
        pools: &mut PoolPair<'_>,
        filter: &L,
        port: &PortState,
    ) -> Option<(PacketRef, Disposition)> {
        let lp = self.pending(pools, Priority::Low);
        let hp = self.pending(pools, Priority::High);
        let pkt = match self.policy {
            QueuePolicy::LowPriorityFirst => lp.or(hp),
            QueuePolicy::HighPriorityFirst => hp.or(lp),
        }?;

        let priority = pkt.priority();
        let pool = pools.get_mut(priority)?;
        pool.advance_cursor(&mut self.cursors[priority as usize]);

        let mut header = pool.header(pkt);
        let len = header.length as usize;
        if !(ETH_HEADER_SIZE..=MAX_TAGGED_PACKET_SIZE).contains(&len) {
            self.rejected = self.rejected.wrapping_add(1);
            pool.free(pkt);
            return Some((pkt, Disposition::BadLength));
        }

        let mut bytes = [0u8; ETH_HEADER_SIZE + VLAN_TAG_SIZE];
        pool.read_payload(pkt, 0, &mut bytes);
        let Some(frame) = FrameInfo::parse(&bytes, len) else {
            self.rejected = self.rejected.wrapping_add(1);
            pool.free(pkt);
            return Some((pkt, Disposition::BadLength));
        };

        let key = FilterKey::from_addr(&frame.dst);
        let matched = match frame.vlan {
            Some(vid) => filter.lookup(key.with_vlan(vid)).or_else(|| filter.lookup(key)),
            None => filter.lookup(key),
        };

        let Some((result, appdata)) = matched else {
            self.rejected = self.rejected.wrapping_add(1);
            pool.free(pkt);
            return Some((pkt, Disposition::NoMatch));
        };

        let mut wanted = FilterResult::NONE.with_hp(result.is_hp());
        for client in result.clients().filter(|&c| c < CLIENTS) {
            if self.clients[client].accepts_ethertype(frame.ethertype) {
                wanted = wanted | FilterResult::from_bits(1 << client);
            }
        }
        if wanted.interfaces() == 0 {
            self.rejected = self.rejected.wrapping_add(1);
            pool.free(pkt);
            return Some((pkt, Disposition::NoMatch));
        }

        header.filter_result = wanted;
        header.filter_data = appdata;
        header.vlan_tagged = frame.vlan.is_some();
        header.stage = PacketStage::Filtered;
        header.timestamp = port.adjust_rx_timestamp(header.timestamp);

        let mut delivered = 0u32;
        for client in wanted.clients() {
            if self.clients[client].deliver(pkt) {
                delivered += 1;
            }
        }

        if delivered == 0 {
            self.rejected = self.rejected.wrapping_add(1);
            pool.free(pkt);
            return Some((pkt, Disposition::QueuesFull));
        }
        header.tcount = delivered - 1;
        pool.set_header(pkt, &header);
        Some((pkt, Disposition::Delivered(delivered)))
    }

    /// Process every pending frame; returns how many were processed
    pub fn process_all<L: AddressLookup>(
        &mut self,
        pools: &mut PoolPair<'_>,
        filter: &L,
        port: &PortState,
    ) -> usize {
        let mut count = 0;
        while self.process(pools, filter, port).is_some() {
            count += 1;
        }
        count
    }

    /// Copy the oldest frame queued for `client` into `buf` and release it.
    ///
    /// The frame is truncated to `buf.len()`. The VLAN tag is removed when
    /// the client asked for it. The pool record is freed once the last
    /// interested client has collected the frame.
    pub fn get_packet(&mut self, client: usize, pools: &mut PoolPair<'_>, buf: &mut [u8]) -> Option<PacketInfo> {
        let state = self.clients.get_mut(client)?;
        let index = state.queue().read_index();
        let pkt = state.queue().get_next()?;
        let pool = pools.get_mut(pkt.priority())?;
        let header = pool.header(pkt);

        let len = if state.strips_vlan() && header.vlan_tagged {
            let head = ETHERTYPE_OFFSET.min(buf.len());
            let copied = pool.read_payload(pkt, 0, &mut buf[..head]);
            copied + pool.read_payload(pkt, ETHERTYPE_OFFSET + VLAN_TAG_SIZE, &mut buf[head..])
        } else {
            pool.read_payload(pkt, 0, buf)
        };

        state.queue_mut().free_index(index);
        if pool.get_and_dec_transmit_count(pkt) == 0 {
            pool.free(pkt);
        }

        Some(PacketInfo {
            len,
            timestamp: header.timestamp,
            src_port: header.src_port,
            filter_data: header.filter_data,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
