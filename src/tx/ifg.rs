//! Inter-frame gap guard.
//!
//! The transmitter records when the last frame ended and computes the
//! earliest start of the next one. Both are raw 32-bit reference timer
//! values, so the comparison has to cope with the timer wrapping between
//! them or while the port was idle.

use embedded_hal::delay::DelayNs;

use crate::driver::config::Speed;
use crate::internal::constants::IFG_BIT_TIMES;

/// Free-running 32-bit reference timer
pub trait RefTimer {
    /// Current tick count
    fn ticks(&mut self) -> u32;
}

/// Whether the transmitter must wait before starting the next frame.
///
/// If `next_start` lies after `last_end` without wrapping, waiting is only
/// needed while `now` is strictly between them. If `next_start` wrapped past
/// the top of the timer, waiting is needed while `now < next_start`. A long
/// idle gap therefore costs at most one extra gap instead of a full timer
/// period.
#[inline]
#[must_use]
pub const fn wait_required(last_end: u32, next_start: u32, now: u32) -> bool {
    if next_start > last_end {
        now > last_end && now < next_start
    } else {
        now < next_start
    }
}

/// Inter-frame gap in reference timer ticks at `speed`, rounded up
#[must_use]
pub const fn ifg_ticks(speed: Speed, timer_hz: u32) -> u32 {
    let bps = speed.bits_per_second() as u64;
    let ticks = (IFG_BIT_TIMES as u64 * timer_hz as u64).div_ceil(bps);
    ticks as u32
}

/// Block until the gap after the previous frame has elapsed.
///
/// Delays through `delay` in steps of the remaining time. Returns `true` if
/// any wait was needed.
pub fn wait_for_ifg<T, D>(timer: &mut T, delay: &mut D, timer_hz: u32, last_end: u32, next_start: u32) -> bool
where
    T: RefTimer,
    D: DelayNs,
{
    let mut waited = false;
    loop {
        let now = timer.ticks();
        if !wait_required(last_end, next_start, now) {
            return waited;
        }
        let remaining = next_start.wrapping_sub(now) as u64;
        let ns = (remaining * 1_000_000_000).div_ceil(timer_hz.max(1) as u64);
        delay.delay_ns(ns.clamp(1, u32::MAX as u64) as u32);
        waited = true;
    }
}

// =============================================================================
// Tests
// =============================================================================
