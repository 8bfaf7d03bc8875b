//! IEEE 802.1Qav credit-based shaper.
//!
//! Credit is a signed fixed-point bit count with
//! [`CREDIT_FRACTIONAL_BITS`] fractional bits. It accrues at the port's idle
//! slope while time passes and is spent by every high-priority frame sent.

use crate::driver::port::PortState;
use crate::internal::constants::{CREDIT_FRACTIONAL_BITS, WIRE_OVERHEAD_BYTES};

/// Per-port shaper state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CreditShaper {
    prev_time: u32,
    credit: i32,
}

impl CreditShaper {
    /// Shaper with zero credit
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prev_time: 0,
            credit: 0,
        }
    }

    /// Shaper starting at `credit`, last evaluated at `now`
    #[must_use]
    pub const fn with_credit(credit: i32, now: u32) -> Self {
        Self {
            prev_time: now,
            credit,
        }
    }

    /// Restart from zero credit with `now` as the last evaluation.
    ///
    /// Without this the first evaluation would accrue credit for every tick
    /// since timer zero.
    pub fn reset(&mut self, now: u32) {
        self.prev_time = now;
        self.credit = 0;
    }

    /// Current credit in fixed-point bits
    #[inline(always)]
    pub const fn credit(&self) -> i32 {
        self.credit
    }

    /// Timestamp of the last evaluation
    #[inline(always)]
    pub const fn prev_time(&self) -> u32 {
        self.prev_time
    }

    /// Accrue credit up to `now` and gate the high-priority candidate.
    ///
    /// Returns the candidate if it may be sent, `None` if credit is negative.
    /// Without a candidate any positive credit is discarded so that an idle
    /// period cannot build up a burst.
    pub fn do_idle_slope<T>(&mut self, candidate: Option<T>, port: &PortState, now: u32) -> Option<T> {
        let elapsed = now.wrapping_sub(self.prev_time) as i64;
        let accrued = (self.credit as i64).saturating_add(elapsed.saturating_mul(port.qav_idle_slope as i64));
        let mut credit = accrued.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        if port.qav_credit_limit != 0 && credit > port.qav_credit_limit {
            credit = port.qav_credit_limit;
        }
        self.prev_time = now;

        let allowed = match candidate {
            Some(frame) if credit >= 0 => Some(frame),
            Some(_) => None,
            None => {
                if credit > 0 {
                    credit = 0;
                }
                None
            }
        };
        self.credit = credit;
        allowed
    }

    /// Spend the credit for a frame of `len_bytes` that was just sent
    pub fn do_send_slope(&mut self, len_bytes: u32) {
        let bits = ((len_bytes as i64) + WIRE_OVERHEAD_BYTES as i64) << (CREDIT_FRACTIONAL_BITS + 3);
        self.credit = (self.credit as i64 - bits).max(i32::MIN as i64) as i32;
    }
}

// =============================================================================
// Tests
// =============================================================================
