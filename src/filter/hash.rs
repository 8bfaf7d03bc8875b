//! Two-choice MAC address hash table.
//!
//! Each key has two candidate slots, one per CRC polynomial. Inserts follow a
//! bounded cuckoo displacement chain; when the chain overflows the table is
//! rebuilt from a source copy with perturbed polynomials. Lookups always
//! evaluate both hashes so their cost does not depend on the table contents.

use super::key::FilterKey;
use super::result::FilterResult;
use crate::driver::error::{FilterError, FilterOpResult};
use crate::internal::constants::{
    HASH_POLY_0, HASH_POLY_1, INSERT_CHAIN_MARGIN, MAX_REHASH_ATTEMPTS, POLY_LCG_A, POLY_LCG_C,
};

#[cfg(feature = "defmt")]
use defmt::debug;
#[cfg(all(feature = "log", not(feature = "defmt")))]
use log::debug;

/// Reflected CRC-32 step: fold `data` into `crc` under `poly`
#[inline]
const fn crc32_step(crc: u32, data: u32, poly: u32) -> u32 {
    let mut x = crc ^ data;
    let mut i = 0;
    while i < 32 {
        x = if x & 1 != 0 { (x >> 1) ^ poly } else { x >> 1 };
        i += 1;
    }
    x
}

/// Slot index of `key` under `poly` in a table of `N` slots
#[inline]
fn hash_index<const N: usize>(key: FilterKey, poly: u32) -> usize {
    #[cfg(test)]
    eval_counter::bump();
    let x = crc32_step(crc32_step(key.0[0], key.0[1], poly), 0, poly);
    x as usize & (N - 1)
}

/// Advance a polynomial with the rebuild LCG
#[inline(always)]
const fn next_poly(poly: u32) -> u32 {
    POLY_LCG_A.wrapping_mul(poly).wrapping_add(POLY_LCG_C)
}


/// One table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TableEntry {
    /// Hash key, [`FilterKey::ZERO`] when the slot is free
    pub key: FilterKey,
    /// Interested clients and priority
    pub result: FilterResult,
    /// Application data reported with matches
    pub appdata: u32,
}

impl TableEntry {
    const EMPTY: Self = Self {
        key: FilterKey::ZERO,
        result: FilterResult::NONE,
        appdata: 0,
    };

    #[inline(always)]
    const fn is_free(&self) -> bool {
        self.key.is_zero()
    }
}

/// Fixed-size MAC address hash table.
///
/// `N` must be a power of two.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HashTable<const N: usize> {
    polys: [u32; 2],
    num_entries: usize,
    entries: [TableEntry; N],
}

impl<const N: usize> Default for HashTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> HashTable<N> {
    const SIZE_OK: () = assert!(N.is_power_of_two(), "hash table size must be a power of two");

    /// Create an empty table with the initial polynomials
    #[must_use]
    pub const fn new() -> Self {
        let () = Self::SIZE_OK;
        Self {
            polys: [HASH_POLY_0, HASH_POLY_1],
            num_entries: 0,
            entries: [TableEntry::EMPTY; N],
        }
    }

    /// Free every slot and restore the initial polynomials
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    fn clear_entries(&mut self) {
        self.entries = [TableEntry::EMPTY; N];
        self.num_entries = 0;
    }

    /// Number of occupied slots
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.num_entries
    }

    /// Whether no slot is occupied
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    /// Current polynomial pair
    #[inline(always)]
    pub const fn polys(&self) -> [u32; 2] {
        self.polys
    }

    /// Occupied slots
    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter().filter(|e| !e.is_free())
    }

    /// Look up a key, returning its result and application data.
    ///
    /// Both candidate slots are hashed and compared on every call.
    #[must_use]
    pub fn lookup(&self, key: FilterKey) -> Option<(FilterResult, u32)> {
        let x = hash_index::<N>(key, self.polys[0]);
        let y = hash_index::<N>(key, self.polys[1]);

        if key.is_zero() {
            return None;
        }
        let hit = if self.entries[y].key == key {
            Some(&self.entries[y])
        } else if self.entries[x].key == key {
            Some(&self.entries[x])
        } else {
            None
        };
        hit.map(|e| (e.result, e.appdata))
    }

    fn find(&self, key: FilterKey) -> Option<usize> {
        if key.is_zero() {
            return None;
        }
        [self.polys[0], self.polys[1]]
            .into_iter()
            .map(|poly| hash_index::<N>(key, poly))
            .find(|&i| self.entries[i].key == key)
    }

    /// Place an entry, displacing others along a bounded chain.
    ///
    /// An existing entry for the key has `result` OR-ed in, or replaced when
    /// `replace` is set. Returns `false` if the chain overflowed; the table
    /// is then missing one displaced entry and must be rebuilt.
    fn insert(&mut self, key: FilterKey, result: FilterResult, appdata: u32, replace: bool) -> bool {
        if let Some(i) = self.find(key) {
            let slot = &mut self.entries[i];
            slot.result = if replace { result } else { slot.result | result };
            slot.appdata = appdata;
            return true;
        }

        let mut current = TableEntry {
            key,
            result,
            appdata,
        };
        let mut hashtype = 0;
        let bound = N + INSERT_CHAIN_MARGIN;

        for count in 0..bound {
            let index = hash_index::<N>(current.key, self.polys[hashtype]);
            let slot = &mut self.entries[index];
            if slot.is_free() {
                *slot = current;
                self.num_entries += 1;
                return true;
            }
            // First conflict tries the other slot, later ones evict.
            if count > 0 {
                core::mem::swap(slot, &mut current);
            }
            hashtype = 1 - hashtype;
        }
        false
    }

    /// Rebuild this table from `source` with new polynomials, then insert
    /// `extra` if given.
    ///
    /// On failure the table is restored to a copy of `source`.
    fn rebuild_from(
        &mut self,
        source: &Self,
        extra: Option<(FilterKey, FilterResult, u32)>,
    ) -> FilterOpResult<()> {
        for attempt in 1..=MAX_REHASH_ATTEMPTS {
            self.clear_entries();
            self.polys = [next_poly(self.polys[0]), next_poly(self.polys[1])];

            let refilled = source
                .iter()
                .all(|e| self.insert(e.key, e.result, e.appdata, true));
            let placed = refilled
                && match extra {
                    Some((key, result, appdata)) => self.insert(key, result, appdata, false),
                    None => true,
                };
            if placed {
                #[cfg(any(feature = "defmt", feature = "log"))]
                debug!("mac filter rebuilt after {} attempt(s)", attempt);
                #[cfg(not(any(feature = "defmt", feature = "log")))]
                let _ = attempt;
                return Ok(());
            }
        }
        *self = *source;
        Err(FilterError::TableFull)
    }

    /// Add `result` for `key`, rebuilding from `source` if the chain overflows.
    ///
    /// `source` must hold the same entries as `self` before the call. Returns
    /// `true` if a rebuild happened, in which case `self` no longer matches
    /// the layout of `source`.
    pub(crate) fn add(
        &mut self,
        source: &Self,
        key: FilterKey,
        result: FilterResult,
        appdata: u32,
    ) -> FilterOpResult<bool> {
        if key.is_zero() {
            return Err(FilterError::ZeroAddress);
        }
        if self.num_entries >= N && self.find(key).is_none() {
            return Err(FilterError::TableFull);
        }
        if self.insert(key, result, appdata, false) {
            return Ok(false);
        }
        self.rebuild_from(source, Some((key, result, appdata)))?;
        Ok(true)
    }

    /// Remove `client` from the entry for `key` if its priority class matches.
    ///
    /// The slot is freed once no client remains. Returns `false` if nothing
    /// changed.
    pub(crate) fn delete(&mut self, key: FilterKey, client: usize, is_hp: bool) -> bool {
        let Some(i) = self.find(key) else {
            return false;
        };
        let slot = &mut self.entries[i];
        if slot.result.is_hp() != is_hp || !slot.result.has_client(client) {
            return false;
        }
        let result = slot.result.without_client(client);
        if result.is_empty() {
            *slot = TableEntry::EMPTY;
            self.num_entries -= 1;
        } else {
            slot.result = result;
        }
        true
    }

    /// Remove `client` from every entry of the given priority class.
    ///
    /// Returns the number of entries changed.
    pub(crate) fn clear_client(&mut self, client: usize, is_hp: bool) -> usize {
        let mut changed = 0;
        for slot in &mut self.entries {
            if slot.is_free() || slot.result.is_hp() != is_hp || !slot.result.has_client(client) {
                continue;
            }
            let result = slot.result.without_client(client);
            if result.is_empty() {
                *slot = TableEntry::EMPTY;
                self.num_entries -= 1;
            } else {
                slot.result = result;
            }
            changed += 1;
        }
        changed
    }
}

// =============================================================================
// Tests
// =============================================================================
