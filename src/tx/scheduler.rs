//! Transmit scheduling.
//!
//! Clients place frames in a transmit pool and queue them per priority. The
//! transmit task asks [`TxScheduler::select_next`] for the next frame: the
//! high-priority candidate is gated by the credit shaper and low priority
//! fills in when it is refused or absent. Clients are served round-robin
//! within each priority.

use super::ifg::{ifg_ticks, wait_required};
use super::shaper::CreditShaper;
use crate::buffer::{MemPool, PacketHeader, PacketQueue, PacketRef, PacketStage, Priority};
use crate::buffer::{TimestampEntry, TimestampQueue};
use crate::driver::config::Speed;
use crate::driver::error::{ConfigError, QueueError};
use crate::driver::port::PortState;

/// Frame picked for transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxSelection {
    /// Record in the transmit pool
    pub pkt: PacketRef,
    /// Client that queued it
    pub client: usize,
    /// Slot in the client's queue
    pub index: usize,
}

/// Per-port transmit scheduler
pub struct TxScheduler<const CLIENTS: usize, const Q: usize, const TS: usize> {
    lp: [PacketQueue<Q>; CLIENTS],
    hp: [PacketQueue<Q>; CLIENTS],
    next_client: [usize; 2],
    shaper: CreditShaper,
    shaper_armed: bool,
    timestamps: TimestampQueue<TS>,
    last_frame_end: u32,
    timestamps_dropped: u32,
}

impl<const CLIENTS: usize, const Q: usize, const TS: usize> Default for TxScheduler<CLIENTS, Q, TS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CLIENTS: usize, const Q: usize, const TS: usize> TxScheduler<CLIENTS, Q, TS> {
    /// Create an idle scheduler
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lp: [const { PacketQueue::new() }; CLIENTS],
            hp: [const { PacketQueue::new() }; CLIENTS],
            next_client: [0; 2],
            shaper: CreditShaper::new(),
            shaper_armed: false,
            timestamps: TimestampQueue::new(),
            last_frame_end: 0,
            timestamps_dropped: 0,
        }
    }

    /// Shaper state
    #[inline(always)]
    pub const fn shaper(&self) -> &CreditShaper {
        &self.shaper
    }

    /// Restart the shaper at `now` with zero credit.
    ///
    /// Call on link-up. The shaper is also restarted on the first selection
    /// after it was enabled on the port.
    pub fn reset_shaper(&mut self, now: u32) {
        self.shaper.reset(now);
        self.shaper_armed = true;
    }

    /// Timestamps lost because the timestamp queue was full
    #[inline(always)]
    pub const fn timestamps_dropped(&self) -> u32 {
        self.timestamps_dropped
    }

    /// End time of the last completed frame
    #[inline(always)]
    pub const fn last_frame_end(&self) -> u32 {
        self.last_frame_end
    }

    fn queues(&self, priority: Priority) -> &[PacketQueue<Q>; CLIENTS] {
        match priority {
            Priority::Low => &self.lp,
            Priority::High => &self.hp,
        }
    }

    fn queues_mut(&mut self, priority: Priority) -> &mut [PacketQueue<Q>; CLIENTS] {
        match priority {
            Priority::Low => &mut self.lp,
            Priority::High => &mut self.hp,
        }
    }

    /// Whether `client` can queue another frame of `priority`
    pub fn can_send(&self, client: usize, priority: Priority) -> bool {
        self.queues(priority)
            .get(client)
            .is_some_and(|queue| !queue.is_full())
    }

    /// Queue a committed frame for `client`.
    ///
    /// The priority comes from the pool the frame was committed to.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidClient`] for an unknown client
    /// - [`QueueError::Full`] if the client's queue is full
    pub fn enqueue(&mut self, client: usize, pkt: PacketRef) -> crate::Result<()> {
        let queue = self
            .queues_mut(pkt.priority())
            .get_mut(client)
            .ok_or(ConfigError::InvalidClient)?;
        queue.add(pkt)?;
        Ok(())
    }

    /// Copy `frame` into `pool` and queue it for `client`.
    ///
    /// A `timed` send asks for the egress timestamp to be reported through
    /// [`get_timestamp`](Self::get_timestamp).
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidClient`] for an unknown client
    /// - [`QueueError::Full`] if the client's queue or the pool has no room
    pub fn send_packet(
        &mut self,
        pool: &mut MemPool<'_>,
        client: usize,
        frame: &[u8],
        timed: bool,
        now: u32,
    ) -> crate::Result<PacketRef> {
        if client >= CLIENTS {
            return Err(ConfigError::InvalidClient.into());
        }
        if !self.can_send(client, pool.priority()) {
            return Err(QueueError::Full.into());
        }
        let mut res = pool.reserve_at_least(frame.len()).ok_or(QueueError::Full)?;
        pool.write(&mut res, frame);

        let mut header = PacketHeader::new(0, now);
        if timed {
            header.timestamp_id = client as u32 + 1;
        }
        let pkt = pool.commit(res, header).ok_or(QueueError::Full)?;
        self.enqueue(client, pkt)?;
        Ok(pkt)
    }

    fn peek(&self, priority: Priority) -> Option<TxSelection> {
        let queues = self.queues(priority);
        let start = self.next_client[priority as usize];
        (0..CLIENTS)
            .map(|i| (start + i) % CLIENTS)
            .find_map(|client| {
                let queue = &queues[client];
                queue.get_next().map(|pkt| TxSelection {
                    pkt,
                    client,
                    index: queue.read_index(),
                })
            })
    }

    /// Pick the next frame to send at `now`.
    ///
    /// With the shaper enabled a high-priority frame is held back while the
    /// credit is negative; a low-priority frame is chosen instead if any.
    pub fn select_next(&mut self, port: &PortState, now: u32) -> Option<TxSelection> {
        let hp = self.peek(Priority::High);
        let hp = if port.qav_shaper_enabled {
            if !self.shaper_armed {
                self.reset_shaper(now);
            }
            self.shaper.do_idle_slope(hp, port, now)
        } else {
            self.shaper_armed = false;
            hp
        };
        hp.or_else(|| self.peek(Priority::Low))
    }

    /// Whether the gap after the previous frame still has to elapse at `now`
    pub fn ifg_wait_required(&self, speed: Speed, timer_hz: u32, now: u32) -> bool {
        let next_start = self.last_frame_end.wrapping_add(ifg_ticks(speed, timer_hz));
        wait_required(self.last_frame_end, next_start, now)
    }

    /// Finish a transmitted frame.
    ///
    /// Spends shaper credit for high-priority frames, stamps the egress time
    /// (corrected by the port's egress latency), queues the timestamp for a
    /// timed send, and releases the frame from its queue and pool.
    pub fn complete(
        &mut self,
        pool: &mut MemPool<'_>,
        sel: TxSelection,
        tx_timestamp: u32,
        end_time: u32,
        port: &PortState,
    ) {
        debug_assert_eq!(pool.priority(), sel.pkt.priority(), "completed on wrong pool");
        let priority = sel.pkt.priority();
        let mut header = pool.header(sel.pkt);

        if priority.is_hp() && port.qav_shaper_enabled {
            self.shaper.do_send_slope(header.length);
        }

        let stamp = port.adjust_tx_timestamp(tx_timestamp);
        header.timestamp = stamp;
        header.stage = PacketStage::Sent;
        pool.set_header(sel.pkt, &header);

        if header.timestamp_id != 0
            && self.timestamps.add_entry(header.timestamp_id - 1, stamp).is_err()
        {
            self.timestamps_dropped = self.timestamps_dropped.wrapping_add(1);
        }

        self.queues_mut(priority)[sel.client].free_index(sel.index);
        self.next_client[priority as usize] = (sel.client + 1) % CLIENTS;
        self.last_frame_end = end_time;
        pool.free(sel.pkt);
    }

    /// Oldest pending egress timestamp
    pub fn get_timestamp(&mut self) -> Option<TimestampEntry> {
        self.timestamps.get_entry()
    }
}

// =============================================================================
// Tests
// =============================================================================
