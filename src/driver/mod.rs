//! Configuration, port state, and errors shared by every part of the core.
//!
//! - [`config`] - Runtime configuration and link enums
//! - [`error`] - Error types and result aliases
//! - [`port`] - Per-port link, shaper and timestamp settings
//!
//! # Example
//!
//! ```ignore
//! use mii_mac::driver::{MacConfig, PortState, QueuePolicy};
//!
//! let config = MacConfig::new()
//!     .with_traffic_shaper(true)
//!     .with_queue_policy(QueuePolicy::HighPriorityFirst);
//! let mut port = PortState::from_config(&config);
//! port.set_idle_slope(75_000_000);
//! ```

// Submodules
pub mod config;
pub mod error;
pub mod port;

// Re-exports for convenience
pub use config::{LinkState, MacConfig, NUM_SPEEDS, QueuePolicy, Speed};
pub use error::{
    ConfigError, ConfigResult, Error, FilterError, FilterOpResult, QueueError, QueueResult, Result,
};
pub use port::{PortState, credit_limit_calc, idle_slope_bps_calc};
