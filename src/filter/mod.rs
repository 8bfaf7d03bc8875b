//! MAC address filtering.
//!
//! - [`key`] - Addresses and two-word hash keys
//! - [`result`] - Client-set and priority encoding of a match
//! - [`hash`] - Two-choice hash table with cuckoo displacement
//! - [`table`] - Double-buffered table shared between filter threads and
//!   the control path
//!
//! # Example
//!
//! ```ignore
//! use mii_mac::filter::{MacAddrFilter, MacAddress, MacFilterEntry};
//!
//! static FILTER: MacAddrFilter<256> = MacAddrFilter::new();
//!
//! // Control path
//! let mut writer = FILTER.writer().unwrap();
//! writer.add_entry(0, false, &MacFilterEntry::new(MacAddress::BROADCAST))?;
//!
//! // Filter thread
//! let reader = FILTER.reader(0).unwrap();
//! if let Some((result, appdata)) = reader.lookup(key) {
//!     // deliver to result.clients()
//! }
//! ```

pub mod hash;
pub mod key;
pub mod result;
pub mod table;

pub use hash::{HashTable, TableEntry};
pub use key::{FilterKey, MacAddress, MacFilterEntry};
pub use result::FilterResult;
pub use table::{AddressLookup, FilterReader, FilterWriter, MacAddrFilter};
