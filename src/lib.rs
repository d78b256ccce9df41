//! UTrie: compact code point tries and sparse arrays.
//!
//! UTrie maps the whole Unicode code point space `0..=0x10FFFF` to small integer
//! values using a two-level block index. Identical blocks are folded together
//! and adjacent blocks are overlapped, so that property tables with long runs
//! of equal values take little space while lookups stay O(1).
//!
//! # Data structures
//!
//! - [`Builder`] is a mutable trie that accepts point and range writes.
//! - [`FrozenTrie`] is an immutable, compacted trie produced by freezing a builder.
//!   Values are stored in 8, 16 or 32 bits depending on the type parameter.
//! - [`CompactArray`] is a legacy two-level array keyed by a 16-bit ordinal.
//!
//! Besides the main code point mapping, every trie carries a second lane keyed by
//! UTF-16 lead surrogate code units `0xD800..=0xDBFF`, written with
//! [`Builder::set_for_lead_surrogate_code_unit`] and read with
//! [`CodePointMap::get_from_u16_single_lead`].
//!
//! # Examples
//!
//! ## Building and looking up values
//!
//! ```
//! use utrie::{Builder, CodePointMap};
//!
//! let mut builder = Builder::new(0, 0xbad);
//! builder.set_range(0x40, 0xe6, 0x1234, false).unwrap();
//! let trie = builder.freeze16().unwrap();
//!
//! assert_eq!(trie.get(0x3f), 0);
//! assert_eq!(trie.get(0x40), 0x1234);
//! assert_eq!(trie.get(0xe6), 0x1234);
//! assert_eq!(trie.get(0x110000), 0xbad);
//! ```
//!
//! ## Enumerating ranges
//!
//! [`CodePointMap::iter`] produces maximal runs of code points sharing a value,
//! followed by the runs of the lead surrogate lane.
//!
//! ```
//! use utrie::{Builder, CodePointMap};
//!
//! let mut builder = Builder::new(0, 0xbad);
//! builder.set_range(0x41, 0x5a, 1, true).unwrap();
//! let trie = builder.freeze32().unwrap();
//!
//! let ranges: Vec<_> = trie
//!     .iter()
//!     .filter(|r| !r.lead_surrogate)
//!     .map(|r| (r.start, r.end, r.value))
//!     .collect();
//! assert_eq!(ranges, vec![(0, 0x40, 0), (0x41, 0x5a, 1), (0x5b, 0x10ffff, 0)]);
//! ```
//!
//! ## Serializing and deserializing the data structure
//!
//! To serialize/deserialize a frozen trie into/from a byte sequence,
//! use [`FrozenTrie::serialize_to_vec`]/[`FrozenTrie::deserialize_from_slice`].
//!
//! ```
//! use utrie::{Builder, CodePointMap, FrozenTrie};
//!
//! let mut builder = Builder::new(0, 0xbad);
//! builder.set(0x1f600, 7).unwrap();
//! let trie = builder.freeze16().unwrap();
//!
//! let bytes = trie.serialize_to_vec();
//! let (other, rest) = FrozenTrie::<u16>::deserialize_from_slice(&bytes).unwrap();
//!
//! assert!(rest.is_empty());
//! assert_eq!(bytes.len(), trie.io_bytes());
//! assert_eq!(other.get(0x1f600), 7);
//! assert!(trie == other);
//! ```
#![deny(missing_docs)]

#[cfg(target_pointer_width = "16")]
compile_error!("`target_pointer_width` must be larger than or equal to 32");

pub mod builder;
pub mod compact_array;
pub mod errors;
pub mod format;
pub mod trie;
mod utils;
pub mod value;

pub use builder::Builder;
pub use compact_array::CompactArray;
pub use trie::iter::{Range, RangeIter};
#[cfg(feature = "units-iter")]
pub use trie::units::{UnitValue, UnitsIter};
pub use trie::{peek_value_width, AnyTrie, FrozenTrie};
pub use value::{TrieValue, ValueWidth};

use errors::{Result, TrieError};

/// The largest Unicode code point.
pub const MAX_CODE_POINT: u32 = 0x10ffff;

pub(crate) const CODE_POINT_LIMIT: u32 = 0x110000;

// Shift size for getting the index-1 table offset.
pub(crate) const SHIFT_1: u32 = 6 + 5;
// Shift size for getting the index-2 table offset.
pub(crate) const SHIFT_2: u32 = 5;
// Difference between the two shift sizes, for getting an index-1 offset from an index-2 offset.
pub(crate) const SHIFT_1_2: u32 = SHIFT_1 - SHIFT_2;

// Number of index-1 entries for the BMP, omitted from the serialized index-1 table.
pub(crate) const OMITTED_BMP_INDEX_1_LENGTH: usize = 0x10000 >> SHIFT_1;
pub(crate) const CP_PER_INDEX_1_ENTRY: u32 = 1 << SHIFT_1;

pub(crate) const INDEX_2_BLOCK_LENGTH: usize = 1 << SHIFT_1_2;
pub(crate) const INDEX_2_MASK: u32 = (INDEX_2_BLOCK_LENGTH - 1) as u32;

pub(crate) const DATA_BLOCK_LENGTH: usize = 1 << SHIFT_2;
pub(crate) const DATA_MASK: u32 = (DATA_BLOCK_LENGTH - 1) as u32;

// Data offsets in the index are stored shifted right by INDEX_SHIFT,
// so every data block starts at a multiple of DATA_GRANULARITY.
pub(crate) const INDEX_SHIFT: u32 = 2;
pub(crate) const DATA_GRANULARITY: usize = 1 << INDEX_SHIFT;

// The part of the index-2 table for U+D800..U+DBFF stores values for
// lead surrogate code units; lead surrogate code points use a separate block.
pub(crate) const LSCP_INDEX_2_OFFSET: usize = 0x10000 >> SHIFT_2;
pub(crate) const LSCP_INDEX_2_LENGTH: usize = 0x400 >> SHIFT_2;

// Count of index-2 entries for the BMP, including the lead surrogate code point block.
pub(crate) const INDEX_2_BMP_LENGTH: usize = LSCP_INDEX_2_OFFSET + LSCP_INDEX_2_LENGTH;

// The index-1 table for supplementary code points follows the BMP index-2 table.
pub(crate) const INDEX_1_OFFSET: usize = INDEX_2_BMP_LENGTH;
pub(crate) const MAX_INDEX_1_LENGTH: usize = 0x100000 >> SHIFT_1;

// Values for U+0000..U+00FF are stored linearly at the start of the data array.
pub(crate) const LATIN1_DATA_LENGTH: usize = 0x100;

/// Read access shared by [`Builder`], [`FrozenTrie`] and [`AnyTrie`].
///
/// Values are always reported as `u32`, whatever the storage width.
pub trait CodePointMap {
    /// Returns the value for a code point, or the error value if `code_point`
    /// is greater than [`MAX_CODE_POINT`].
    fn get(&self, code_point: u32) -> u32;

    /// Returns the value for a UTF-16 code unit.
    ///
    /// For lead surrogates `0xD800..=0xDBFF` this reads the separate lead surrogate
    /// lane; for every other code unit it is the same as [`CodePointMap::get`].
    fn get_from_u16_single_lead(&self, code_unit: u16) -> u32;

    /// The value of all code points that were never set.
    fn initial_value(&self) -> u32;

    /// The value returned for out-of-range code points.
    fn error_value(&self) -> u32;

    /// Returns the last code point in `[start, limit)` such that every code point
    /// from `start` up to it has `value`, where `value == self.get(start)`.
    #[doc(hidden)]
    fn range_end(&self, start: u32, limit: u32, value: u32) -> u32 {
        let mut c = start + 1;
        while c < limit && self.get(c) == value {
            c += 1;
        }
        c - 1
    }

    /// Creates an iterator of value ranges: the whole code point space first,
    /// then the lead surrogate lane.
    fn iter(&self) -> RangeIter<'_, Self>
    where
        Self: Sized,
    {
        RangeIter::new(self, identity as fn(u32) -> u32)
    }

    /// Same as [`CodePointMap::iter`], but every value is passed through `mapper`
    /// before adjacent ranges are merged.
    ///
    /// # Examples
    ///
    /// ```
    /// use utrie::{Builder, CodePointMap};
    ///
    /// let mut builder = Builder::new(0, 0);
    /// builder.set(0x30, 0x101).unwrap();
    /// builder.set(0x31, 0x201).unwrap();
    ///
    /// let ranges: Vec<_> = builder
    ///     .iter_mapped(|v| v & 1)
    ///     .take(3)
    ///     .map(|r| (r.start, r.end, r.value))
    ///     .collect();
    /// assert_eq!(ranges, vec![(0, 0x2f, 0), (0x30, 0x31, 1), (0x32, 0x10ffff, 0)]);
    /// ```
    fn iter_mapped<F>(&self, mapper: F) -> RangeIter<'_, Self, F>
    where
        Self: Sized,
        F: Fn(u32) -> u32,
    {
        RangeIter::new(self, mapper)
    }

    /// Creates an iterator over the 1024 supplementary code points whose UTF-16
    /// form starts with `lead`.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when `lead` is not a lead surrogate.
    fn iter_for_lead_surrogate(&self, lead: u16) -> Result<RangeIter<'_, Self>>
    where
        Self: Sized,
    {
        self.iter_for_lead_surrogate_mapped(lead, identity as fn(u32) -> u32)
    }

    /// Same as [`CodePointMap::iter_for_lead_surrogate`] with a value mapper.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when `lead` is not a lead surrogate.
    fn iter_for_lead_surrogate_mapped<F>(&self, lead: u16, mapper: F) -> Result<RangeIter<'_, Self, F>>
    where
        Self: Sized,
        F: Fn(u32) -> u32,
    {
        if !(0xd800..=0xdbff).contains(&lead) {
            return Err(TrieError::range(u32::from(lead), u32::from(lead), 0xdbff));
        }
        Ok(RangeIter::for_lead_surrogate(self, lead, mapper))
    }

    /// Creates a cursor over UTF-16 `text` starting at code unit `index`, producing
    /// the value of each code point. Unpaired surrogates are looked up as code points.
    #[cfg(feature = "units-iter")]
    fn units_iter<'t>(&'t self, text: &'t [u16], index: usize) -> UnitsIter<'t, Self>
    where
        Self: Sized,
    {
        UnitsIter::new(self, text, index)
    }
}

/// Memory statistics of a data structure.
pub trait Statistics {
    /// Returns the total amount of heap used by this data structure in bytes.
    fn heap_bytes(&self) -> usize;

    /// Returns the number of stored values, including shared and padding ones.
    fn num_elems(&self) -> usize;
}

#[inline(always)]
const fn identity(v: u32) -> u32 {
    v
}

#[inline(always)]
pub(crate) const fn is_lead_surrogate(c: u32) -> bool {
    c >= 0xd800 && c < 0xdc00
}
