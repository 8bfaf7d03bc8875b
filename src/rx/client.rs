//! Receive client state.

use crate::buffer::{PacketQueue, PacketRef};
use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::MAX_ETHERTYPE_FILTERS;

/// Link status notification state of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusUpdateState {
    /// Notifications disabled
    #[default]
    Ignoring,
    /// Enabled, nothing to report
    Waiting,
    /// A link change has not been collected yet
    Pending,
}

/// State kept for one receive client
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxClient<const Q: usize> {
    queue: PacketQueue<Q>,
    dropped: u32,
    ethertypes: [u16; MAX_ETHERTYPE_FILTERS],
    num_ethertypes: usize,
    strip_vlan: bool,
    status_update: StatusUpdateState,
}

impl<const Q: usize> Default for RxClient<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const Q: usize> RxClient<Q> {
    /// Client with an empty queue that accepts every EtherType
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: PacketQueue::new(),
            dropped: 0,
            ethertypes: [0; MAX_ETHERTYPE_FILTERS],
            num_ethertypes: 0,
            strip_vlan: false,
            status_update: StatusUpdateState::Ignoring,
        }
    }

    /// Packets waiting for this client
    #[inline(always)]
    pub const fn queue(&self) -> &PacketQueue<Q> {
        &self.queue
    }

    #[inline(always)]
    pub(crate) fn queue_mut(&mut self) -> &mut PacketQueue<Q> {
        &mut self.queue
    }

    /// Whether a packet is ready to be collected
    #[inline(always)]
    pub const fn packet_ready(&self) -> bool {
        self.queue.get_next().is_some()
    }

    /// Packets dropped because the queue was full
    #[inline(always)]
    pub const fn dropped_packets(&self) -> u32 {
        self.dropped
    }

    /// Queue `pkt`, counting a drop if the queue is full
    pub(crate) fn deliver(&mut self, pkt: PacketRef) -> bool {
        if self.queue.add(pkt).is_ok() {
            true
        } else {
            self.dropped = self.dropped.wrapping_add(1);
            false
        }
    }

    // =========================================================================
    // EtherType filters
    // =========================================================================

    /// Accept frames of `ethertype`.
    ///
    /// Once any filter is set, only the listed EtherTypes are delivered.
    /// Adding a type that is already listed does nothing.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TooManyEthertypeFilters`] if the list is full.
    pub fn add_ethertype_filter(&mut self, ethertype: u16) -> ConfigResult<()> {
        if self.ethertype_filters().contains(&ethertype) {
            return Ok(());
        }
        if self.num_ethertypes == MAX_ETHERTYPE_FILTERS {
            return Err(ConfigError::TooManyEthertypeFilters);
        }
        self.ethertypes[self.num_ethertypes] = ethertype;
        self.num_ethertypes += 1;
        Ok(())
    }

    /// Stop accepting `ethertype`; returns whether it was listed
    pub fn remove_ethertype_filter(&mut self, ethertype: u16) -> bool {
        let Some(pos) = self.ethertype_filters().iter().position(|&e| e == ethertype) else {
            return false;
        };
        self.ethertypes.copy_within(pos + 1..self.num_ethertypes, pos);
        self.num_ethertypes -= 1;
        true
    }

    /// Accept every EtherType again
    pub fn clear_ethertype_filters(&mut self) {
        self.num_ethertypes = 0;
    }

    /// Listed EtherTypes
    pub fn ethertype_filters(&self) -> &[u16] {
        &self.ethertypes[..self.num_ethertypes]
    }

    /// Whether a frame of `ethertype` is wanted
    pub fn accepts_ethertype(&self, ethertype: u16) -> bool {
        self.num_ethertypes == 0 || self.ethertype_filters().contains(&ethertype)
    }

    // =========================================================================
    // Options
    // =========================================================================

    /// Remove 802.1Q tags from frames handed to this client
    pub fn set_strip_vlan(&mut self, strip: bool) {
        self.strip_vlan = strip;
    }

    /// Whether VLAN tags are removed
    #[inline(always)]
    pub const fn strips_vlan(&self) -> bool {
        self.strip_vlan
    }

    /// Start reporting link changes
    pub fn enable_link_status_notification(&mut self) {
        if self.status_update == StatusUpdateState::Ignoring {
            self.status_update = StatusUpdateState::Waiting;
        }
    }

    /// Stop reporting link changes and forget a pending one
    pub fn disable_link_status_notification(&mut self) {
        self.status_update = StatusUpdateState::Ignoring;
    }

    /// Notification state
    #[inline(always)]
    pub const fn status_update_state(&self) -> StatusUpdateState {
        self.status_update
    }

    pub(crate) fn link_status_changed(&mut self) {
        if self.status_update == StatusUpdateState::Waiting {
            self.status_update = StatusUpdateState::Pending;
        }
    }

    /// Collect a pending link change notification
    pub fn take_status_update(&mut self) -> bool {
        if self.status_update == StatusUpdateState::Pending {
            self.status_update = StatusUpdateState::Waiting;
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
