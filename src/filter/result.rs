//! Filter result encoding.

use crate::driver::error::{FilterError, FilterOpResult};
use crate::internal::constants::MAX_FILTER_CLIENTS;

/// Bit marking a high-priority result
const HP_BIT: u32 = 1 << 31;

/// Set of interested clients plus a priority flag.
///
/// Bits 0..=30 are the client set, bit 31 marks high priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct FilterResult(u32);

impl FilterResult {
    /// No interested client
    pub const NONE: Self = Self(0);

    /// Result selecting a single client
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidClient`] if `client` cannot be encoded.
    pub const fn for_client(client: usize) -> FilterOpResult<Self> {
        if client >= MAX_FILTER_CLIENTS {
            return Err(FilterError::InvalidClient);
        }
        Ok(Self(1 << client))
    }

    /// Wrap raw bits
    #[inline(always)]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Client set without the priority flag
    #[inline(always)]
    pub const fn interfaces(self) -> u32 {
        self.0 & !HP_BIT
    }

    /// Whether the result is in the high-priority class
    #[inline(always)]
    pub const fn is_hp(self) -> bool {
        self.0 & HP_BIT != 0
    }

    /// Set or clear the priority flag
    #[inline(always)]
    #[must_use]
    pub const fn with_hp(self, is_hp: bool) -> Self {
        if is_hp {
            Self(self.0 | HP_BIT)
        } else {
            Self(self.0 & !HP_BIT)
        }
    }

    /// Whether no client is selected
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.interfaces() == 0
    }

    /// Whether `client` is in the set
    #[inline]
    pub const fn has_client(self, client: usize) -> bool {
        client < MAX_FILTER_CLIENTS && self.0 & (1 << client) != 0
    }

    /// Remove `client` from the set, keeping the priority flag
    #[inline]
    #[must_use]
    pub const fn without_client(self, client: usize) -> Self {
        if client < MAX_FILTER_CLIENTS {
            Self(self.0 & !(1 << client))
        } else {
            self
        }
    }

    /// Number of clients in the set
    #[inline]
    pub const fn client_count(self) -> u32 {
        self.interfaces().count_ones()
    }

    /// Iterate over client indices in ascending order
    pub fn clients(self) -> impl Iterator<Item = usize> {
        let set = self.interfaces();
        (0..MAX_FILTER_CLIENTS).filter(move |&c| set & (1 << c) != 0)
    }
}

impl core::ops::BitOr for FilterResult {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    #[test]
    fn client_bits_and_priority_are_independent() {
        let result = FilterResult::for_client(4).unwrap().with_hp(true);
        assert_eq!(result.interfaces(), 1 << 4);
        assert!(result.is_hp());
        assert!(!result.with_hp(false).is_hp());
        assert_eq!(result.with_hp(false).interfaces(), 1 << 4);
    }

    #[test]
    fn rejects_unencodable_client() {
        assert_eq!(
            FilterResult::for_client(MAX_FILTER_CLIENTS),
            Err(FilterError::InvalidClient)
        );
        assert!(FilterResult::for_client(MAX_FILTER_CLIENTS - 1).is_ok());
    }

    #[test]
    fn removing_last_client_leaves_only_priority() {
        let result = FilterResult::for_client(0).unwrap().with_hp(true);
        let cleared = result.without_client(0);
        assert!(cleared.is_empty());
        assert!(cleared.is_hp());
    }

    #[test]
    fn clients_iterates_set_bits() {
        let result = FilterResult::from_bits(0b1010_0001) | FilterResult::NONE.with_hp(true);
        let clients: Vec<usize> = result.clients().collect();
        assert_eq!(clients, [0, 5, 7]);
        assert_eq!(result.client_count(), 3);
        assert!(result.has_client(5));
        assert!(!result.has_client(31));
    }
}
