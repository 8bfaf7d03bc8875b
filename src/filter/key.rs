//! MAC addresses and hash keys.

use crate::internal::constants::MAC_ADDR_LEN;

/// 48-bit Ethernet MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacAddress(pub [u8; MAC_ADDR_LEN]);

impl MacAddress {
    /// Broadcast address `ff:ff:ff:ff:ff:ff`
    pub const BROADCAST: Self = Self([0xFF; MAC_ADDR_LEN]);

    /// Create from raw bytes
    #[inline(always)]
    pub const fn new(bytes: [u8; MAC_ADDR_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    #[inline(always)]
    pub const fn octets(&self) -> [u8; MAC_ADDR_LEN] {
        self.0
    }

    /// Group (multicast or broadcast) address
    #[inline(always)]
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Read the destination address at the start of a frame
    #[must_use]
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        let bytes: [u8; MAC_ADDR_LEN] = frame.get(..MAC_ADDR_LEN)?.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl From<[u8; MAC_ADDR_LEN]> for MacAddress {
    fn from(bytes: [u8; MAC_ADDR_LEN]) -> Self {
        Self(bytes)
    }
}

impl core::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Two-word hash key of an address, optionally qualified by a VLAN id.
///
/// `key0` holds address bytes 0..4 little-endian, `key1` holds bytes 4..6
/// in its low half and `0x8000 | vid` in its high half when a VLAN is set.
/// The all-zero key marks an empty table slot and never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterKey(pub [u32; 2]);

impl FilterKey {
    /// Empty-slot marker
    pub const ZERO: Self = Self([0, 0]);

    /// Key of an untagged address
    #[must_use]
    pub const fn from_addr(addr: &MacAddress) -> Self {
        let a = &addr.0;
        let key0 = a[0] as u32 | (a[1] as u32) << 8 | (a[2] as u32) << 16 | (a[3] as u32) << 24;
        let key1 = a[4] as u32 | (a[5] as u32) << 8;
        Self([key0, key1])
    }

    /// Qualify the key with a 12-bit VLAN id
    #[must_use]
    pub const fn with_vlan(self, vid: u16) -> Self {
        let tag = (0x8000 | (vid as u32 & 0x0FFF)) << 16;
        Self([self.0[0], (self.0[1] & 0xFFFF) | tag])
    }

    /// Whether this is the empty-slot marker
    #[inline(always)]
    pub const fn is_zero(&self) -> bool {
        self.0[0] == 0 && self.0[1] == 0
    }
}

/// Address filter request from a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacFilterEntry {
    /// Address to match
    pub addr: MacAddress,
    /// Optional VLAN id qualifying the address
    pub vlan: Option<u16>,
    /// Opaque value reported with every matching frame
    pub appdata: u32,
}

impl MacFilterEntry {
    /// Untagged entry without application data
    #[must_use]
    pub const fn new(addr: MacAddress) -> Self {
        Self {
            addr,
            vlan: None,
            appdata: 0,
        }
    }

    /// Attach application data
    #[must_use]
    pub const fn with_appdata(mut self, appdata: u32) -> Self {
        self.appdata = appdata;
        self
    }

    /// Restrict the entry to a VLAN
    #[must_use]
    pub const fn with_vlan(mut self, vid: u16) -> Self {
        self.vlan = Some(vid);
        self
    }

    /// Hash key of the entry
    #[must_use]
    pub const fn key(&self) -> FilterKey {
        let key = FilterKey::from_addr(&self.addr);
        match self.vlan {
            Some(vid) => key.with_vlan(vid),
            None => key,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn key_packs_bytes_little_endian() {
        let key = FilterKey::from_addr(&MacAddress([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]));
        assert_eq!(key.0, [0x0403_0201, 0x0000_0605]);
        assert!(!key.is_zero());
        assert!(FilterKey::from_addr(&MacAddress::default()).is_zero());
    }

    #[test]
    fn vlan_occupies_upper_half_of_second_word() {
        let base = FilterKey::from_addr(&MacAddress([0, 0, 0, 0, 0xAB, 0xCD]));
        let tagged = base.with_vlan(0x123);
        assert_eq!(tagged.0[1], 0x8123_CDAB);
        assert_eq!(tagged.0[0], base.0[0]);

        // VLAN 0 on the zero address is still a real key
        assert!(!FilterKey::ZERO.with_vlan(0).is_zero());
    }

    #[test]
    fn entry_key_honors_vlan() {
        let addr = MacAddress([0x02, 0, 0, 0, 0, 1]);
        assert_eq!(MacFilterEntry::new(addr).key(), FilterKey::from_addr(&addr));
        assert_eq!(
            MacFilterEntry::new(addr).with_vlan(5).key(),
            FilterKey::from_addr(&addr).with_vlan(5)
        );
    }

    #[test]
    fn address_display_and_frame_parse() {
        let frame = [0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E, 0xFF];
        let addr = MacAddress::from_frame(&frame).unwrap();
        assert_eq!(format!("{addr}"), "00:1a:2b:3c:4d:5e");
        assert!(MacAddress::from_frame(&frame[..5]).is_none());
        assert!(MacAddress::BROADCAST.is_multicast());
        assert!(!addr.is_multicast());
    }
}
