//! Test helpers shared by the unit tests: frame builders and a manual clock.

#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::cell::Cell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::internal::constants::{ETH_HEADER_SIZE, ETHERTYPE_VLAN};
use crate::tx::RefTimer;

// =============================================================================
// Frames
// =============================================================================

/// Source address used by every generated frame
pub const TEST_SRC: [u8; 6] = [0x02, 0x00, 0x00, 0xAA, 0xBB, 0xCC];

/// Builder for raw Ethernet frames (without FCS)
pub struct FrameBuilder {
    dst: [u8; 6],
    ethertype: u16,
    vlan: Option<u16>,
    payload: Vec<u8>,
}

impl FrameBuilder {
    pub fn new(dst: [u8; 6]) -> Self {
        Self {
            dst,
            ethertype: 0x0800,
            vlan: None,
            payload: Vec::new(),
        }
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.ethertype = ethertype;
        self
    }

    pub fn vlan(mut self, vid: u16) -> Self {
        self.vlan = Some(vid);
        self
    }

    pub fn payload(mut self, bytes: &[u8]) -> Self {
        self.payload = bytes.to_vec();
        self
    }

    /// Frame of exactly `len` bytes; the payload is padded with a counting
    /// pattern or truncated.
    pub fn build(self, len: usize) -> Vec<u8> {
        let mut frame = Vec::with_capacity(len.max(ETH_HEADER_SIZE + 4));
        frame.extend_from_slice(&self.dst);
        frame.extend_from_slice(&TEST_SRC);
        if let Some(vid) = self.vlan {
            frame.extend_from_slice(&ETHERTYPE_VLAN.to_be_bytes());
            frame.extend_from_slice(&(vid & 0x0FFF).to_be_bytes());
        }
        frame.extend_from_slice(&self.ethertype.to_be_bytes());
        frame.extend_from_slice(&self.payload);
        let mut fill = 0u8;
        while frame.len() < len {
            frame.push(fill);
            fill = fill.wrapping_add(1);
        }
        frame.truncate(len);
        frame
    }
}

/// Untagged IPv4-typed frame of `len` bytes to `dst`
pub fn frame_to(dst: [u8; 6], len: usize) -> Vec<u8> {
    FrameBuilder::new(dst).build(len)
}

// =============================================================================
// Clock
// =============================================================================

/// Reference timer advanced by hand, shared with [`ManualDelay`]
#[derive(Clone)]
pub struct ManualClock {
    ticks: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn new(start: u32) -> Self {
        Self {
            ticks: Rc::new(Cell::new(start)),
        }
    }

    pub fn now(&self) -> u32 {
        self.ticks.get()
    }

    pub fn advance(&self, ticks: u32) {
        self.ticks.set(self.ticks.get().wrapping_add(ticks));
    }
}

impl RefTimer for ManualClock {
    fn ticks(&mut self) -> u32 {
        self.now()
    }
}

/// Delay that moves a [`ManualClock`] forward instead of sleeping
pub struct ManualDelay {
    clock: ManualClock,
    timer_hz: u32,
    total_ns: u64,
}

impl ManualDelay {
    pub fn new(clock: &ManualClock, timer_hz: u32) -> Self {
        Self {
            clock: clock.clone(),
            timer_hz,
            total_ns: 0,
        }
    }

    /// Nanoseconds delayed so far
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }
}

impl DelayNs for ManualDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        let ticks = (u64::from(ns) * u64::from(self.timer_hz)).div_ceil(1_000_000_000);
        self.clock.advance(ticks as u32);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let frame = FrameBuilder::new([1; 6]).vlan(0x123).ethertype(0x88F7).payload(&[9, 9]).build(24);
        assert_eq!(frame.len(), 24);
        assert_eq!(&frame[12..14], &[0x81, 0x00]);
        assert_eq!(&frame[14..16], &[0x01, 0x23]);
        assert_eq!(&frame[16..18], &[0x88, 0xF7]);
        assert_eq!(&frame[18..20], &[9, 9]);
    }

    #[test]
    fn delay_advances_shared_clock() {
        let clock = ManualClock::new(10);
        let mut delay = ManualDelay::new(&clock, 100_000_000);
        delay.delay_ns(1_000);
        assert_eq!(clock.now(), 110);
        assert_eq!(delay.total_ns(), 1_000);
    }
}
