//! Double-buffered MAC address filter.
//!
//! Two [`HashTable`] copies are kept in sync: the active one is read by the
//! filter threads through [`FilterReader`], the backup one is mutated by the
//! single [`FilterWriter`]. After an update the writer publishes the backup
//! as the new active table, waits for the readers to move over, then applies
//! the same change (or a full copy after a rebuild) to the old table.
//!
//! # Synchronization
//!
//! - `active` selects the table readers use.
//! - `in_flight[t]` counts lookups currently dereferencing table `t`. A
//!   reader increments it, then re-reads `active`; if the table changed in
//!   between it backs out and retries. The writer touches a table only after
//!   it stopped being active and its counter dropped to zero.
//! - `waiting[i]` is raised by the writer on a swap and cleared by reader `i`
//!   on its next lookup. The writer spins on it at most
//!   [`SWAP_ACK_RETRIES`] times so an idle reader cannot stall updates.
//!
//! Readers never block: a lookup does a bounded amount of work plus a retry
//! that only happens when it races a swap.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use super::hash::HashTable;
use super::key::{FilterKey, MacFilterEntry};
use super::result::FilterResult;
use crate::driver::config::MacConfig;
use crate::driver::error::{ConfigError, ConfigResult, FilterError, FilterOpResult};
use crate::internal::constants::{MAX_FILTER_CLIENTS, MAX_FILTER_THREADS, SWAP_ACK_RETRIES};

#[cfg(feature = "defmt")]
use defmt::warn;
#[cfg(all(feature = "log", not(feature = "defmt")))]
use log::warn;

/// Source of destination-address classification for the receive path
pub trait AddressLookup {
    /// Result and application data for `key`, `None` if no client wants it
    fn lookup(&self, key: FilterKey) -> Option<(FilterResult, u32)>;
}

impl<const N: usize> AddressLookup for HashTable<N> {
    #[inline]
    fn lookup(&self, key: FilterKey) -> Option<(FilterResult, u32)> {
        HashTable::lookup(self, key)
    }
}

/// Shared filter state: two tables plus swap bookkeeping
pub struct MacAddrFilter<const N: usize> {
    tables: [UnsafeCell<HashTable<N>>; 2],
    active: AtomicUsize,
    in_flight: [AtomicU32; 2],
    waiting: [AtomicBool; MAX_FILTER_THREADS],
    reader_claimed: [AtomicBool; MAX_FILTER_THREADS],
    filter_threads: AtomicUsize,
    writer_claimed: AtomicBool,
}

// SAFETY: Readers only take shared references to the active table while its
// in-flight counter is raised. The writer is unique (claimed through
// `writer_claimed`) and takes a mutable reference only to the table that is
// not active and has no lookups in flight.
unsafe impl<const N: usize> Sync for MacAddrFilter<N> {}

impl<const N: usize> Default for MacAddrFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MacAddrFilter<N> {
    /// Create an empty filter (const, suitable for static initialization)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tables: [
                UnsafeCell::new(HashTable::new()),
                UnsafeCell::new(HashTable::new()),
            ],
            active: AtomicUsize::new(0),
            in_flight: [AtomicU32::new(0), AtomicU32::new(0)],
            waiting: [const { AtomicBool::new(false) }; MAX_FILTER_THREADS],
            reader_claimed: [const { AtomicBool::new(false) }; MAX_FILTER_THREADS],
            filter_threads: AtomicUsize::new(MAX_FILTER_THREADS),
            writer_claimed: AtomicBool::new(false),
        }
    }

    /// Limit the filter thread slots to `config.num_filter_threads`.
    ///
    /// Slots at or above the limit can no longer be claimed; readers that
    /// already hold one keep it until dropped.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FilterThreadUnavailable`] if the count is 0 or above
    /// [`MAX_FILTER_THREADS`].
    pub fn configure(&self, config: &MacConfig) -> ConfigResult<()> {
        let threads = config.num_filter_threads;
        if threads == 0 || threads > MAX_FILTER_THREADS {
            return Err(ConfigError::FilterThreadUnavailable);
        }
        self.filter_threads.store(threads, Ordering::Release);
        Ok(())
    }

    /// Number of filter thread slots that can be claimed
    #[inline]
    pub fn filter_threads(&self) -> usize {
        self.filter_threads.load(Ordering::Acquire)
    }

    /// Claim the lookup handle of filter thread `filter_num`.
    ///
    /// Returns `None` if the slot is out of range or already claimed. The
    /// slot is released when the reader is dropped.
    pub fn reader(&self, filter_num: usize) -> Option<FilterReader<'_, N>> {
        if filter_num >= self.filter_threads() {
            return None;
        }
        let claimed = self.reader_claimed.get(filter_num)?;
        claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.waiting[filter_num].store(false, Ordering::Release);
        Some(FilterReader {
            filter: self,
            filter_num,
        })
    }

    /// Claim the update handle.
    ///
    /// Returns `None` while another writer is alive.
    pub fn writer(&self) -> Option<FilterWriter<'_, N>> {
        self.writer_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(FilterWriter { filter: self })
    }

    /// Index of the table readers currently use
    #[inline]
    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Pin the active table, returning its index.
    fn pin(&self) -> usize {
        loop {
            let t = self.active.load(Ordering::SeqCst);
            self.in_flight[t].fetch_add(1, Ordering::SeqCst);
            if self.active.load(Ordering::SeqCst) == t {
                return t;
            }
            self.in_flight[t].fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[inline]
    fn unpin(&self, t: usize) {
        self.in_flight[t].fetch_sub(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Lookup handle owned by one filter thread
pub struct FilterReader<'a, const N: usize> {
    filter: &'a MacAddrFilter<N>,
    filter_num: usize,
}

impl<const N: usize> FilterReader<'_, N> {
    /// Filter thread slot of this reader
    #[inline(always)]
    pub const fn filter_num(&self) -> usize {
        self.filter_num
    }

    /// Look up `key` in the active table, acknowledging any pending swap
    pub fn lookup(&self, key: FilterKey) -> Option<(FilterResult, u32)> {
        self.filter.waiting[self.filter_num].store(false, Ordering::Release);
        let t = self.filter.pin();
        // SAFETY: table `t` is pinned; the writer does not mutate a table
        // with lookups in flight.
        let found = unsafe { &*self.filter.tables[t].get() }.lookup(key);
        self.filter.unpin(t);
        found
    }
}

impl<const N: usize> AddressLookup for FilterReader<'_, N> {
    #[inline]
    fn lookup(&self, key: FilterKey) -> Option<(FilterResult, u32)> {
        FilterReader::lookup(self, key)
    }
}

impl<const N: usize> Drop for FilterReader<'_, N> {
    fn drop(&mut self) {
        self.filter.waiting[self.filter_num].store(false, Ordering::Release);
        self.filter.reader_claimed[self.filter_num].store(false, Ordering::Release);
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Unique update handle
pub struct FilterWriter<'a, const N: usize> {
    filter: &'a MacAddrFilter<N>,
}

impl<const N: usize> FilterWriter<'_, N> {
    /// Backup table (mutable) and active table (shared)
    fn tables(&mut self) -> (&mut HashTable<N>, &HashTable<N>) {
        let active = self.filter.active.load(Ordering::SeqCst);
        // SAFETY: `&mut self` makes this the only live borrow through the
        // writer. The backup table is not active and `swap` waited for its
        // lookups to drain, so no reader holds a reference to it. The active
        // table is only read.
        unsafe {
            (
                &mut *self.filter.tables[1 - active].get(),
                &*self.filter.tables[active].get(),
            )
        }
    }

    /// Publish the backup table and wait until the old one is unused
    fn swap(&mut self) {
        let filter = self.filter;
        let old = filter.active.load(Ordering::SeqCst);
        filter.active.store(1 - old, Ordering::SeqCst);

        for (waiting, claimed) in filter.waiting.iter().zip(&filter.reader_claimed) {
            if claimed.load(Ordering::Acquire) {
                waiting.store(true, Ordering::Release);
            }
        }

        for (filter_num, waiting) in filter.waiting.iter().enumerate() {
            let mut retries = SWAP_ACK_RETRIES;
            while waiting.load(Ordering::Acquire) && retries > 0 {
                retries -= 1;
                core::hint::spin_loop();
            }
            if retries == 0 {
                #[cfg(any(feature = "defmt", feature = "log"))]
                warn!("filter thread {} did not acknowledge table swap", filter_num);
                #[cfg(not(any(feature = "defmt", feature = "log")))]
                let _ = filter_num;
                break;
            }
        }

        while filter.in_flight[old].load(Ordering::SeqCst) != 0 {
            core::hint::spin_loop();
        }
    }

    /// Make the backup an exact copy of the active table
    fn sync_backup(&mut self) {
        let (backup, active) = self.tables();
        *backup = *active;
    }

    /// Add `client` to the entry for `entry`.
    ///
    /// # Errors
    ///
    /// - [`FilterError::InvalidClient`] if the client cannot be encoded
    /// - [`FilterError::ZeroAddress`] for the all-zero key
    /// - [`FilterError::TableFull`] if no layout fits even after rebuilding;
    ///   the filter is unchanged
    pub fn add_entry(
        &mut self,
        client: usize,
        is_hp: bool,
        entry: &MacFilterEntry,
    ) -> FilterOpResult<()> {
        let result = FilterResult::for_client(client)?.with_hp(is_hp);
        let key = entry.key();

        let (backup, active) = self.tables();
        let rebuilt = backup.add(active, key, result, entry.appdata)?;
        self.swap();

        if rebuilt {
            self.sync_backup();
        } else {
            let (backup, active) = self.tables();
            if !matches!(backup.add(active, key, result, entry.appdata), Ok(false)) {
                *backup = *active;
            }
        }
        Ok(())
    }

    /// Remove `client` from the entry for `entry` if the priority class
    /// matches.
    ///
    /// Returns `false` and leaves the tables untouched if nothing matched.
    pub fn delete_entry(&mut self, client: usize, is_hp: bool, entry: &MacFilterEntry) -> bool {
        if client >= MAX_FILTER_CLIENTS {
            return false;
        }
        let key = entry.key();
        let (backup, _) = self.tables();
        if !backup.delete(key, client, is_hp) {
            return false;
        }
        self.swap();
        let (backup, _) = self.tables();
        backup.delete(key, client, is_hp);
        true
    }

    /// Remove `client` from every entry of one priority class.
    ///
    /// Returns the number of entries changed.
    pub fn clear_client(&mut self, client: usize, is_hp: bool) -> usize {
        if client >= MAX_FILTER_CLIENTS {
            return 0;
        }
        let (backup, _) = self.tables();
        let changed = backup.clear_client(client, is_hp);
        if changed > 0 {
            self.swap();
            let (backup, _) = self.tables();
            backup.clear_client(client, is_hp);
        }
        changed
    }

    /// Remove every entry
    pub fn clear_all(&mut self) {
        let (backup, _) = self.tables();
        backup.clear();
        self.swap();
        let (backup, _) = self.tables();
        backup.clear();
    }

    /// Look up `key` in the active table from the control side
    pub fn lookup(&mut self, key: FilterKey) -> Option<(FilterResult, u32)> {
        let (_, active) = self.tables();
        active.lookup(key)
    }

    /// Number of entries in the active table
    pub fn len(&mut self) -> usize {
        let (_, active) = self.tables();
        active.len()
    }

    /// Whether the active table is empty
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Drop for FilterWriter<'_, N> {
    fn drop(&mut self) {
        self.filter.writer_claimed.store(false, Ordering::Release);
    }
}

// =============================================================================
// Tests
// =============================================================================
