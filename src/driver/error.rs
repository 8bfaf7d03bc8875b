//! Error types for the MAC buffering core
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Initialization and configuration failures
//! - [`FilterError`]: MAC address filter table updates
//! - [`QueueError`]: Packet pointer and timestamp queue operations
//!
//! The unified [`Error`] enum wraps all domain errors.
//!
//! Nothing on the receive hot path returns an error: a full pool hands out a
//! dummy reservation and a full client queue drops the frame and counts it.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and initialization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Invalid configuration parameter
    InvalidConfig,
    /// Pool buffer cannot hold a record header plus the safety margin
    PoolTooSmall,
    /// Client index outside the configured client range
    InvalidClient,
    /// Client already has the maximum number of EtherType filters
    TooManyEthertypeFilters,
    /// Filter thread count outside the supported range
    FilterThreadUnavailable,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::PoolTooSmall => "pool buffer too small",
            ConfigError::InvalidClient => "invalid client index",
            ConfigError::TooManyEthertypeFilters => "too many EtherType filters",
            ConfigError::FilterThreadUnavailable => "unsupported filter thread count",
        }
    }
}

// =============================================================================
// Filter Errors
// =============================================================================

/// MAC address filter table errors
///
/// [`FilterError::TableFull`] is the only operational error the core reports
/// to a client; the others are programming errors on the control path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterError {
    /// No assignment of live entries fits the table, even after rehashing
    TableFull,
    /// Client number cannot be encoded in a filter result
    InvalidClient,
    /// The all-zero address is reserved as the empty-slot marker
    ZeroAddress,
}

impl core::fmt::Display for FilterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FilterError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FilterError::TableFull => "filter table full",
            FilterError::InvalidClient => "client cannot be encoded in filter result",
            FilterError::ZeroAddress => "zero MAC address",
        }
    }
}

// =============================================================================
// Queue Errors
// =============================================================================

/// Packet pointer and timestamp queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// The slot at the write index is still occupied
    Full,
    /// Nothing to read
    Empty,
}

impl core::fmt::Display for QueueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QueueError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            QueueError::Full => "queue full",
            QueueError::Empty => "queue empty",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Filter(FilterError::TableFull)) => { /* ... */ }
///     Err(Error::Queue(QueueError::Full)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Filter table error
    Filter(FilterError),
    /// Queue error
    Queue(QueueError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Filter(e) => write!(f, "filter: {}", e.as_str()),
            Error::Queue(e) => write!(f, "queue: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<FilterError> for Error {
    fn from(e: FilterError) -> Self {
        Error::Filter(e)
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Error::Queue(e)
    }
}

/// Result type alias for core operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for filter table updates
pub type FilterOpResult<T> = core::result::Result<T, FilterError>;

/// Result type alias for queue operations
pub type QueueResult<T> = core::result::Result<T, QueueError>;

// =============================================================================
// Unit Tests
// =============================================================================
