//! Per-port MAC state.
//!
//! [`PortState`] holds what the control plane configures on a port and the
//! data path reads on every frame: link state and speed, the 802.1Qav
//! idle slope and credit ceiling, and timestamp latency corrections.

use super::config::{LinkState, MacConfig, NUM_SPEEDS, Speed};
use crate::internal::constants::{CREDIT_FRACTIONAL_BITS, DEFAULT_TIMER_HZ, WIRE_OVERHEAD_BYTES};

/// Convert bits per second to fixed-point bits per reference timer tick.
///
/// The result carries [`CREDIT_FRACTIONAL_BITS`] fractional bits.
#[must_use]
pub const fn idle_slope_bps_calc(bits_per_second: u32, timer_hz: u32) -> u32 {
    let slope = ((bits_per_second as u64) << CREDIT_FRACTIONAL_BITS) / timer_hz as u64;
    if slope > u32::MAX as u64 {
        u32::MAX
    } else {
        slope as u32
    }
}

/// Convert a payload byte limit to a fixed-point credit ceiling in bits.
///
/// The ceiling covers the payload plus the per-frame wire overhead, matching
/// what the send slope deducts for a frame of that size. Zero disables the
/// ceiling.
#[must_use]
pub const fn credit_limit_calc(payload_bytes: u32) -> i32 {
    if payload_bytes == 0 {
        return 0;
    }
    let bytes = payload_bytes as u64 + WIRE_OVERHEAD_BYTES as u64;
    let limit = bytes << (CREDIT_FRACTIONAL_BITS + 3);
    if limit > i32::MAX as u64 {
        i32::MAX
    } else {
        limit as i32
    }
}

/// Server-side state of one MAC port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortState {
    /// Current link state
    pub link_state: LinkState,
    /// Current link speed
    pub link_speed: Speed,
    /// Whether the credit shaper gates high-priority transmit
    pub qav_shaper_enabled: bool,
    /// Idle slope in fixed-point bits per timer tick
    pub qav_idle_slope: u32,
    /// Credit ceiling in fixed-point bits, 0 when unlimited
    pub qav_credit_limit: i32,
    /// Ingress timestamp latency per speed, in timer ticks
    pub ingress_ts_latency: [u32; NUM_SPEEDS],
    /// Egress timestamp latency per speed, in timer ticks
    pub egress_ts_latency: [u32; NUM_SPEEDS],
    timer_hz: u32,
}

impl Default for PortState {
    fn default() -> Self {
        Self::new()
    }
}

impl PortState {
    /// Create a port in the link-down state with the shaper disabled
    #[must_use]
    pub const fn new() -> Self {
        Self {
            link_state: LinkState::Down,
            link_speed: Speed::Mbps100,
            qav_shaper_enabled: false,
            qav_idle_slope: 0,
            qav_credit_limit: 0,
            ingress_ts_latency: [0; NUM_SPEEDS],
            egress_ts_latency: [0; NUM_SPEEDS],
            timer_hz: DEFAULT_TIMER_HZ,
        }
    }

    /// Create a port from the MAC configuration
    #[must_use]
    pub const fn from_config(config: &MacConfig) -> Self {
        let mut state = Self::new();
        state.qav_shaper_enabled = config.traffic_shaper;
        state.timer_hz = config.timer_hz;
        state
    }

    /// Reference timer frequency used for slope conversion
    #[inline(always)]
    pub const fn timer_hz(&self) -> u32 {
        self.timer_hz
    }

    /// Set the idle slope from a bandwidth in bits per second
    pub fn set_idle_slope(&mut self, bits_per_second: u32) {
        self.qav_idle_slope = idle_slope_bps_calc(bits_per_second, self.timer_hz);
    }

    /// Set the idle slope directly in fixed-point bits per tick
    pub fn set_idle_slope_raw(&mut self, slope: u32) {
        self.qav_idle_slope = slope;
    }

    /// Set the credit ceiling from a payload byte limit (0 disables it)
    pub fn set_credit_limit(&mut self, payload_byte_limit: u32) {
        self.qav_credit_limit = credit_limit_calc(payload_byte_limit);
    }

    /// Update the link state
    ///
    /// Returns `true` if the state changed.
    pub fn set_link_state(&mut self, state: LinkState, speed: Speed) -> bool {
        let changed = self.link_state != state || self.link_speed != speed;
        self.link_state = state;
        self.link_speed = speed;
        changed
    }

    /// Set the ingress timestamp latency for a speed
    pub fn set_ingress_timestamp_latency(&mut self, speed: Speed, ticks: u32) {
        self.ingress_ts_latency[speed.index()] = ticks;
    }

    /// Set the egress timestamp latency for a speed
    pub fn set_egress_timestamp_latency(&mut self, speed: Speed, ticks: u32) {
        self.egress_ts_latency[speed.index()] = ticks;
    }

    /// Receive timestamp corrected by the ingress latency of the current speed
    #[inline]
    pub const fn adjust_rx_timestamp(&self, timestamp: u32) -> u32 {
        timestamp.wrapping_sub(self.ingress_ts_latency[self.link_speed.index()])
    }

    /// Transmit timestamp corrected by the egress latency of the current speed
    #[inline]
    pub const fn adjust_tx_timestamp(&self, timestamp: u32) -> u32 {
        timestamp.wrapping_add(self.egress_ts_latency[self.link_speed.index()])
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_slope_conversion_at_100mhz() {
        // 100 Mbps on a 100 MHz timer is exactly one bit per tick
        assert_eq!(
            idle_slope_bps_calc(100_000_000, 100_000_000),
            1 << CREDIT_FRACTIONAL_BITS
        );
        // 75 Mbps -> 0.75 bits per tick
        assert_eq!(
            idle_slope_bps_calc(75_000_000, 100_000_000),
            (3 << CREDIT_FRACTIONAL_BITS) / 4
        );
        assert_eq!(idle_slope_bps_calc(0, 100_000_000), 0);
    }

    #[test]
    fn set_idle_slope_uses_configured_timer() {
        let config = MacConfig::new().with_timer_hz(50_000_000);
        let mut port = PortState::from_config(&config);
        port.set_idle_slope(50_000_000);
        assert_eq!(port.qav_idle_slope, 1 << CREDIT_FRACTIONAL_BITS);
    }

    #[test]
    fn credit_limit_includes_wire_overhead() {
        let mut port = PortState::new();
        port.set_credit_limit(100);
        assert_eq!(
            port.qav_credit_limit,
            ((100 + WIRE_OVERHEAD_BYTES as i32) * 8) << CREDIT_FRACTIONAL_BITS
        );

        port.set_credit_limit(0);
        assert_eq!(port.qav_credit_limit, 0);
    }

    #[test]
    fn credit_limit_saturates() {
        assert_eq!(credit_limit_calc(u32::MAX), i32::MAX);
    }

    #[test]
    fn link_state_change_detection() {
        let mut port = PortState::new();
        assert!(port.set_link_state(LinkState::Up, Speed::Mbps100));
        assert!(!port.set_link_state(LinkState::Up, Speed::Mbps100));
        assert!(port.set_link_state(LinkState::Up, Speed::Mbps10));
    }

    #[test]
    fn timestamp_latency_per_speed() {
        let mut port = PortState::new();
        port.set_ingress_timestamp_latency(Speed::Mbps100, 30);
        port.set_egress_timestamp_latency(Speed::Mbps100, 20);
        port.set_ingress_timestamp_latency(Speed::Mbps10, 300);

        port.set_link_state(LinkState::Up, Speed::Mbps100);
        assert_eq!(port.adjust_rx_timestamp(1000), 970);
        assert_eq!(port.adjust_tx_timestamp(1000), 1020);

        port.set_link_state(LinkState::Up, Speed::Mbps10);
        assert_eq!(port.adjust_rx_timestamp(1000), 700);
        // Wrap-safe
        assert_eq!(port.adjust_rx_timestamp(100), 100u32.wrapping_sub(300));
    }
}
