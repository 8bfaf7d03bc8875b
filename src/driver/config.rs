//! Configuration types for the MAC buffering core

use crate::internal::constants::{DEFAULT_TIMER_HZ, MAX_FILTER_THREADS};

/// Ethernet link speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// 10 Mbps
    Mbps10,
    /// 100 Mbps
    #[default]
    Mbps100,
    /// 1000 Mbps
    Mbps1000,
}

/// Number of distinct [`Speed`] values (size of per-speed tables)
pub const NUM_SPEEDS: usize = 3;

impl Speed {
    /// Index into per-speed tables such as timestamp latencies
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Speed::Mbps10 => 0,
            Speed::Mbps100 => 1,
            Speed::Mbps1000 => 2,
        }
    }

    /// Bits per second on the wire
    #[must_use]
    pub const fn bits_per_second(self) -> u32 {
        match self {
            Speed::Mbps10 => 10_000_000,
            Speed::Mbps100 => 100_000_000,
            Speed::Mbps1000 => 1_000_000_000,
        }
    }
}

/// Link state reported by the PHY layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Link down
    #[default]
    Down,
    /// Link up
    Up,
}

/// Which receive pool the filter stage drains first when both have work.
///
/// High-priority consumers are expected to drain faster, so the default
/// looks at the low-priority backlog first to keep it from starving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueuePolicy {
    /// Take pending low-priority packets before high-priority ones
    #[default]
    LowPriorityFirst,
    /// Always take pending high-priority packets first
    HighPriorityFirst,
}

/// Runtime configuration of a MAC instance
///
/// Sizes (queue depths, table size, client count) are const generics on the
/// individual structures; this struct holds the values that can be chosen
/// at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacConfig {
    /// Reference timer frequency in Hz (timestamps and shaper ticks)
    pub timer_hz: u32,
    /// Number of filter threads reading the MAC address table (1 or 2)
    pub num_filter_threads: usize,
    /// Separate high-priority receive/transmit path
    pub hp_queues: bool,
    /// 802.1Qav credit shaper on high-priority transmit traffic
    pub traffic_shaper: bool,
    /// Receive pool selection when both priorities have packets pending
    pub queue_policy: QueuePolicy,
}

impl Default for MacConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MacConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timer_hz: DEFAULT_TIMER_HZ,
            num_filter_threads: 1,
            hp_queues: false,
            traffic_shaper: false,
            queue_policy: QueuePolicy::LowPriorityFirst,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the reference timer frequency
    #[must_use]
    pub const fn with_timer_hz(mut self, timer_hz: u32) -> Self {
        self.timer_hz = timer_hz;
        self
    }

    /// Set the number of filter threads
    #[must_use]
    pub const fn with_filter_threads(mut self, count: usize) -> Self {
        self.num_filter_threads = count;
        self
    }

    /// Enable or disable the high-priority path
    #[must_use]
    pub const fn with_hp_queues(mut self, enabled: bool) -> Self {
        self.hp_queues = enabled;
        self
    }

    /// Enable or disable the credit-based shaper
    ///
    /// The shaper only acts on high-priority traffic, so enabling it also
    /// enables the high-priority path.
    #[must_use]
    pub const fn with_traffic_shaper(mut self, enabled: bool) -> Self {
        self.traffic_shaper = enabled;
        if enabled {
            self.hp_queues = true;
        }
        self
    }

    /// Set the receive pool selection policy
    #[must_use]
    pub const fn with_queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.queue_policy = policy;
        self
    }

    /// Check the configuration for values the core cannot run with
    pub const fn validate(&self) -> crate::ConfigResult<()> {
        if self.timer_hz == 0 {
            return Err(crate::ConfigError::InvalidConfig);
        }
        if self.num_filter_threads == 0 || self.num_filter_threads > MAX_FILTER_THREADS {
            return Err(crate::ConfigError::FilterThreadUnavailable);
        }
        if self.traffic_shaper && !self.hp_queues {
            return Err(crate::ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
