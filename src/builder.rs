//! A mutable code point trie.
mod compact;

use crate::errors::{Result, TrieError};
use crate::trie::iter::Range;
use crate::utils::FromU32;
use crate::{is_lead_surrogate, CodePointMap, FrozenTrie, Statistics, TrieValue};
use crate::{
    CODE_POINT_LIMIT, DATA_BLOCK_LENGTH, DATA_MASK, INDEX_2_BLOCK_LENGTH, INDEX_2_BMP_LENGTH,
    INDEX_2_MASK, LATIN1_DATA_LENGTH, LSCP_INDEX_2_LENGTH, LSCP_INDEX_2_OFFSET, MAX_CODE_POINT,
    MAX_INDEX_1_LENGTH, OMITTED_BMP_INDEX_1_LENGTH, SHIFT_1, SHIFT_2,
};

// The index-2 table reserves a gap after the BMP part, where the frozen trie
// stores its index-1 table for supplementary code points.
const INDEX_GAP_OFFSET: usize = INDEX_2_BMP_LENGTH;
const INDEX_GAP_LENGTH: usize =
    (MAX_INDEX_1_LENGTH + INDEX_2_MASK as usize) & !(INDEX_2_MASK as usize);

// The null index-2 block follows the gap; allocated index-2 blocks follow it.
const INDEX_2_NULL_OFFSET: usize = INDEX_GAP_OFFSET + INDEX_GAP_LENGTH;
const INDEX_2_START_OFFSET: usize = INDEX_2_NULL_OFFSET + INDEX_2_BLOCK_LENGTH;
const MAX_INDEX_2_LENGTH: usize = (CODE_POINT_LIMIT as usize >> SHIFT_2)
    + LSCP_INDEX_2_LENGTH
    + INDEX_GAP_LENGTH
    + INDEX_2_BLOCK_LENGTH;

const INDEX_1_LENGTH: usize = CODE_POINT_LIMIT as usize >> SHIFT_1;

// The null data block follows the linear Latin-1 data; allocated blocks follow it.
const DATA_NULL_OFFSET: usize = LATIN1_DATA_LENGTH;
const DATA_START_OFFSET: usize = DATA_NULL_OFFSET + DATA_BLOCK_LENGTH;

const INITIAL_DATA_LENGTH: usize = 1 << 14;
const MEDIUM_DATA_LENGTH: usize = 1 << 17;
const MAX_DATA_LENGTH: usize =
    CODE_POINT_LIMIT as usize + LATIN1_DATA_LENGTH + DATA_BLOCK_LENGTH + 0x400;

// Placeholder for the unused gap entries.
const GAP_MARKER: u32 = u32::MAX;

/// A mutable trie mapping code points to `u32` values.
///
/// Every code point starts out with the initial value. The builder is turned into
/// a compact read-only [`FrozenTrie`] with [`Builder::freeze`]; freezing does not
/// consume the builder, which may be modified and frozen again.
#[derive(Clone)]
pub struct Builder {
    index1: Vec<u32>,
    index2: Vec<u32>,
    data: Vec<u32>,
    // Before compaction: per-data-block reference counters (> 0) or the free-block
    // chain (< 0). During compaction: map from old to new block offsets.
    map: Vec<i32>,
    index2_length: usize,
    data_length: usize,
    first_free_block: usize,
    index2_null_offset: usize,
    data_null_offset: usize,
    initial_value: u32,
    error_value: u32,
}

impl Builder {
    /// Creates a new, empty builder.
    ///
    /// # Arguments
    ///
    /// - `initial_value`: Value of every code point that is never set.
    /// - `error_value`: Value returned for out-of-range code points.
    pub fn new(initial_value: u32, error_value: u32) -> Self {
        let mut data = vec![0; INITIAL_DATA_LENGTH];
        data[..LATIN1_DATA_LENGTH].fill(initial_value);
        data[DATA_NULL_OFFSET..DATA_START_OFFSET].fill(initial_value);

        let mut index2 = vec![0; MAX_INDEX_2_LENGTH];
        let mut map = vec![0; MAX_DATA_LENGTH >> SHIFT_2];

        // Latin-1 blocks are linear and never shared.
        let latin1_blocks = LATIN1_DATA_LENGTH >> SHIFT_2;
        for i in 0..latin1_blocks {
            index2[i] = (i << SHIFT_2) as u32;
            map[i] = 1;
        }

        // Reference count of the null data block: all other blocks of the code
        // point space, the lead surrogate code point blocks, plus one so that it
        // is never released.
        map[DATA_NULL_OFFSET >> SHIFT_2] = ((CODE_POINT_LIMIT as usize >> SHIFT_2) - latin1_blocks
            + 1
            + LSCP_INDEX_2_LENGTH) as i32;

        index2[latin1_blocks..INDEX_2_BMP_LENGTH].fill(DATA_NULL_OFFSET as u32);
        index2[INDEX_GAP_OFFSET..INDEX_GAP_OFFSET + INDEX_GAP_LENGTH].fill(GAP_MARKER);
        index2[INDEX_2_NULL_OFFSET..INDEX_2_START_OFFSET].fill(DATA_NULL_OFFSET as u32);

        // The BMP index-1 entries point to the linear BMP index-2 table.
        let mut index1 = vec![INDEX_2_NULL_OFFSET as u32; INDEX_1_LENGTH];
        for (i, i1) in index1.iter_mut().take(OMITTED_BMP_INDEX_1_LENGTH).enumerate() {
            *i1 = (i * INDEX_2_BLOCK_LENGTH) as u32;
        }

        Self {
            index1,
            index2,
            data,
            map,
            index2_length: INDEX_2_START_OFFSET,
            data_length: DATA_START_OFFSET,
            first_free_block: 0,
            index2_null_offset: INDEX_2_NULL_OFFSET,
            data_null_offset: DATA_NULL_OFFSET,
            initial_value,
            error_value,
        }
    }

    /// Creates a new builder with the same contents as `source`, including its
    /// lead surrogate lane.
    ///
    /// # Examples
    ///
    /// ```
    /// use utrie::{Builder, CodePointMap};
    ///
    /// let mut builder = Builder::new(0, 0xbad);
    /// builder.set_range(0x3040, 0x309f, 2, true).unwrap();
    /// let trie = builder.freeze16().unwrap();
    ///
    /// let mut copy = Builder::from_map(&trie);
    /// copy.set(0x3041, 3).unwrap();
    ///
    /// assert_eq!(copy.get(0x3040), 2);
    /// assert_eq!(copy.get(0x3041), 3);
    /// assert_eq!(trie.get(0x3041), 2);
    /// ```
    pub fn from_map<M>(source: &M) -> Self
    where
        M: CodePointMap,
    {
        let mut builder = Self::new(source.initial_value(), source.error_value());
        for range in source.iter() {
            builder.apply_range(&range, true);
        }
        builder
    }

    /// Sets a value for a code point.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when `code_point` is greater than
    /// [`MAX_CODE_POINT`](crate::MAX_CODE_POINT).
    pub fn set(&mut self, code_point: u32, value: u32) -> Result<()> {
        if code_point > MAX_CODE_POINT {
            return Err(TrieError::range(code_point, code_point, MAX_CODE_POINT));
        }
        self.set_value(code_point, true, value);
        Ok(())
    }

    /// Sets a value in the range of code points `[start..=end]`.
    ///
    /// Every code point in the range gets `value` if `overwrite` is `true` or if
    /// the code point still holds the initial value.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when `start > end` or when `end` is greater
    /// than [`MAX_CODE_POINT`](crate::MAX_CODE_POINT). The builder is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use utrie::{Builder, CodePointMap};
    ///
    /// let mut builder = Builder::new(0, 0xbad);
    /// builder.set_range(0x21, 0x7e, 0x5555, true).unwrap();
    /// builder.set_range(0x72, 0xdc, 3, false).unwrap();
    ///
    /// assert_eq!(builder.get(0x72), 0x5555);
    /// assert_eq!(builder.get(0xdc), 3);
    /// assert!(builder.set_range(0x100, 0xff, 1, true).is_err());
    /// ```
    pub fn set_range(&mut self, start: u32, end: u32, value: u32, overwrite: bool) -> Result<()> {
        if start > end || end > MAX_CODE_POINT {
            return Err(TrieError::range(start, end, MAX_CODE_POINT));
        }
        self.set_range_unchecked(start, end, value, overwrite);
        Ok(())
    }

    /// Sets the values of a [`Range`], typically produced by iterating another trie.
    ///
    /// Ranges flagged as [`Range::lead_surrogate`] write the lead surrogate lane.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when the range is invalid for its lane.
    pub fn set_range_from(&mut self, range: &Range, overwrite: bool) -> Result<()> {
        let max = if range.lead_surrogate { 0xdbff } else { MAX_CODE_POINT };
        if range.start > range.end
            || range.end > max
            || (range.lead_surrogate && range.start < 0xd800)
        {
            return Err(TrieError::range(range.start, range.end, max));
        }
        self.apply_range(range, overwrite);
        Ok(())
    }

    /// Sets a value for a UTF-16 code unit.
    ///
    /// For lead surrogates `0xD800..=0xDBFF`, this writes the lead surrogate lane,
    /// which is separate from the values of the code points U+D800..U+DBFF.
    /// For other code units it is the same as [`Builder::set`].
    pub fn set_for_lead_surrogate_code_unit(&mut self, code_unit: u16, value: u32) {
        self.set_value(u32::from(code_unit), false, value);
    }

    /// Freezes the current contents into a compacted, read-only trie.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when
    ///
    /// - a stored value, the initial value or the error value does not fit in `T`, or
    /// - the compacted arrays are too large for the serialized format.
    pub fn freeze<T>(&self) -> Result<FrozenTrie<T>>
    where
        T: TrieValue,
    {
        let mut work = self.snapshot();
        let high_start = work.compact_trie();
        work.release_frozen(high_start)
    }

    /// Freezes into a trie with 16-bit values.
    ///
    /// # Errors
    ///
    /// See [`Builder::freeze`]; values greater than `0xFFFF` are rejected.
    pub fn freeze16(&self) -> Result<FrozenTrie<u16>> {
        self.freeze()
    }

    /// Freezes into a trie with 32-bit values.
    ///
    /// # Errors
    ///
    /// See [`Builder::freeze`].
    pub fn freeze32(&self) -> Result<FrozenTrie<u32>> {
        self.freeze()
    }

    // Copy for compaction; only the used part of the data array is cloned.
    fn snapshot(&self) -> Self {
        Self {
            index1: self.index1.clone(),
            index2: self.index2[..self.index2_length].to_vec(),
            data: self.data[..self.data_length].to_vec(),
            map: self.map.clone(),
            ..*self
        }
    }

    fn apply_range(&mut self, range: &Range, overwrite: bool) {
        if range.lead_surrogate {
            for c in range.start..=range.end {
                let c = c as u16;
                if overwrite || self.get_from_u16_single_lead(c) == self.initial_value {
                    self.set_for_lead_surrogate_code_unit(c, range.value);
                }
            }
        } else {
            self.set_range_unchecked(range.start, range.end, range.value, overwrite);
        }
    }

    #[inline(always)]
    fn get_value(&self, c: u32, from_lscp: bool) -> u32 {
        let block = self.index2[self.index2_position(c, from_lscp)];
        self.data[usize::from_u32(block) + usize::from_u32(c & DATA_MASK)]
    }

    #[inline(always)]
    fn index2_position(&self, c: u32, for_lscp: bool) -> usize {
        if for_lscp && is_lead_surrogate(c) {
            LSCP_INDEX_2_OFFSET - (0xd800 >> SHIFT_2) + usize::from_u32(c >> SHIFT_2)
        } else {
            usize::from_u32(self.index1[usize::from_u32(c >> SHIFT_1)])
                + usize::from_u32((c >> SHIFT_2) & INDEX_2_MASK)
        }
    }

    fn set_value(&mut self, c: u32, for_lscp: bool, value: u32) {
        let block = self.get_data_block(c, for_lscp);
        self.data[block + usize::from_u32(c & DATA_MASK)] = value;
    }

    pub(crate) fn set_range_unchecked(
        &mut self,
        mut start: u32,
        end: u32,
        value: u32,
        overwrite: bool,
    ) {
        if !overwrite && value == self.initial_value {
            return;
        }

        let mut limit = end + 1;
        if start & DATA_MASK != 0 {
            // Partial block at [start..following block boundary).
            let block = self.get_data_block(start, true);
            let next_start = (start + DATA_BLOCK_LENGTH as u32) & !DATA_MASK;
            if next_start <= limit {
                self.fill_block(block, start & DATA_MASK, DATA_BLOCK_LENGTH as u32, value, overwrite);
                start = next_start;
            } else {
                self.fill_block(block, start & DATA_MASK, limit & DATA_MASK, value, overwrite);
                return;
            }
        }

        // Number of positions in the last, partial block.
        let rest = limit & DATA_MASK;
        limit &= !DATA_MASK;

        // Whole blocks that are overwritten share one repeat block.
        let mut repeat_block = if value == self.initial_value {
            Some(self.data_null_offset)
        } else {
            None
        };

        while start < limit {
            if value == self.initial_value && self.is_in_null_block(start) {
                start += DATA_BLOCK_LENGTH as u32;
                continue;
            }

            let i2 = self.get_index2_block(start, true) + usize::from_u32((start >> SHIFT_2) & INDEX_2_MASK);
            let block = usize::from_u32(self.index2[i2]);
            let set_repeat_block = if self.is_writable_block(block) {
                // Linear Latin-1 blocks are written in place.
                if overwrite && block >= DATA_START_OFFSET {
                    true
                } else {
                    self.fill_block(block, 0, DATA_BLOCK_LENGTH as u32, value, overwrite);
                    false
                }
            } else {
                // Non-writable blocks are the null block or earlier repeat blocks;
                // all of their values are the same.
                self.data[block] != value && (overwrite || block == self.data_null_offset)
            };

            if set_repeat_block {
                match repeat_block {
                    Some(repeat) => self.set_index2_entry(i2, repeat),
                    None => {
                        let repeat = self.get_data_block(start, true);
                        self.data[repeat..repeat + DATA_BLOCK_LENGTH].fill(value);
                        repeat_block = Some(repeat);
                    }
                }
            }

            start += DATA_BLOCK_LENGTH as u32;
        }

        if rest > 0 {
            // Partial block at [last block boundary..limit).
            let block = self.get_data_block(start, true);
            self.fill_block(block, 0, rest, value, overwrite);
        }
    }

    fn fill_block(&mut self, block: usize, start: u32, limit: u32, value: u32, overwrite: bool) {
        let initial_value = self.initial_value;
        let slots = &mut self.data[block + usize::from_u32(start)..block + usize::from_u32(limit)];
        if overwrite {
            slots.fill(value);
        } else {
            slots
                .iter_mut()
                .filter(|v| **v == initial_value)
                .for_each(|v| *v = value);
        }
    }

    fn is_in_null_block(&self, c: u32) -> bool {
        usize::from_u32(self.index2[self.index2_position(c, true)]) == self.data_null_offset
    }

    fn alloc_index2_block(&mut self) -> usize {
        let new_block = self.index2_length;
        let new_top = new_block + INDEX_2_BLOCK_LENGTH;
        if new_top > self.index2.len() {
            self.index2.resize(new_top, 0);
        }
        self.index2_length = new_top;
        self.index2.copy_within(
            self.index2_null_offset..self.index2_null_offset + INDEX_2_BLOCK_LENGTH,
            new_block,
        );
        new_block
    }

    fn get_index2_block(&mut self, c: u32, for_lscp: bool) -> usize {
        if for_lscp && is_lead_surrogate(c) {
            return LSCP_INDEX_2_OFFSET;
        }
        let i1 = usize::from_u32(c >> SHIFT_1);
        let mut i2 = usize::from_u32(self.index1[i1]);
        if i2 == self.index2_null_offset {
            i2 = self.alloc_index2_block();
            self.index1[i1] = i2 as u32;
        }
        i2
    }

    fn alloc_data_block(&mut self, copy_block: usize) -> usize {
        let new_block = if self.first_free_block != 0 {
            let block = self.first_free_block;
            self.first_free_block = (-self.map[block >> SHIFT_2]) as usize;
            block
        } else {
            let block = self.data_length;
            let new_top = block + DATA_BLOCK_LENGTH;
            if new_top > self.data.len() {
                let capacity = if self.data.len() < MEDIUM_DATA_LENGTH {
                    MEDIUM_DATA_LENGTH
                } else {
                    MAX_DATA_LENGTH
                };
                self.data.resize(capacity.max(new_top), 0);
            }
            self.data_length = new_top;
            block
        };
        self.data
            .copy_within(copy_block..copy_block + DATA_BLOCK_LENGTH, new_block);
        self.map[new_block >> SHIFT_2] = 0;
        new_block
    }

    // Called when the block's reference counter reaches 0.
    fn release_data_block(&mut self, block: usize) {
        self.map[block >> SHIFT_2] = -(self.first_free_block as i32);
        self.first_free_block = block;
    }

    #[inline(always)]
    fn is_writable_block(&self, block: usize) -> bool {
        block != self.data_null_offset && self.map[block >> SHIFT_2] == 1
    }

    fn set_index2_entry(&mut self, i2: usize, block: usize) {
        // Increment first, in case block == old_block.
        self.map[block >> SHIFT_2] += 1;
        let old_block = usize::from_u32(self.index2[i2]);
        self.map[old_block >> SHIFT_2] -= 1;
        if self.map[old_block >> SHIFT_2] == 0 {
            self.release_data_block(old_block);
        }
        self.index2[i2] = block as u32;
    }

    // Returns a writable data block for `c`, copying a shared block if needed.
    fn get_data_block(&mut self, c: u32, for_lscp: bool) -> usize {
        let i2 = self.get_index2_block(c, for_lscp) + usize::from_u32((c >> SHIFT_2) & INDEX_2_MASK);
        let old_block = usize::from_u32(self.index2[i2]);
        if self.is_writable_block(old_block) {
            return old_block;
        }
        let new_block = self.alloc_data_block(old_block);
        self.set_index2_entry(i2, new_block);
        new_block
    }
}

impl CodePointMap for Builder {
    #[inline]
    fn get(&self, code_point: u32) -> u32 {
        if code_point > MAX_CODE_POINT {
            self.error_value
        } else {
            self.get_value(code_point, true)
        }
    }

    #[inline]
    fn get_from_u16_single_lead(&self, code_unit: u16) -> u32 {
        self.get_value(u32::from(code_unit), false)
    }

    fn initial_value(&self) -> u32 {
        self.initial_value
    }

    fn error_value(&self) -> u32 {
        self.error_value
    }
}

impl Statistics for Builder {
    fn heap_bytes(&self) -> usize {
        (self.index1.len() + self.index2.len() + self.data.len()) * std::mem::size_of::<u32>()
            + self.map.len() * std::mem::size_of::<i32>()
    }

    fn num_elems(&self) -> usize {
        self.data_length
    }
}

impl<M> PartialEq<M> for Builder
where
    M: CodePointMap,
{
    fn eq(&self, other: &M) -> bool {
        crate::utils::same_contents(self, other)
    }
}

impl Eq for Builder {}

impl core::hash::Hash for Builder {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        crate::utils::hash_contents(self, state);
    }
}

impl core::fmt::Debug for Builder {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Builder")
            .field("initial_value", &self.initial_value)
            .field("error_value", &self.error_value)
            .field("index2_length", &self.index2_length)
            .field("data_length", &self.data_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, Rng, SeedableRng};

    // Dense reference model of the code point lane.
    fn apply_dense(dense: &mut [u32], initial: u32, start: u32, end: u32, value: u32, overwrite: bool) {
        for v in &mut dense[start as usize..=end as usize] {
            if overwrite || *v == initial {
                *v = value;
            }
        }
    }

    #[test]
    fn test_set_range_basic() {
        let mut builder = Builder::new(0, 0xbad);
        builder.set_range(0x40, 0xe6, 0x1234, false).unwrap();
        assert_eq!(builder.get(0x3f), 0);
        assert_eq!(builder.get(0x40), 0x1234);
        assert_eq!(builder.get(0xe6), 0x1234);
        assert_eq!(builder.get(0xe7), 0);
    }

    #[test]
    fn test_error_value() {
        let mut builder = Builder::new(1, 0xbad);
        builder.set_range(0, MAX_CODE_POINT, 7, true).unwrap();
        assert_eq!(builder.get(MAX_CODE_POINT), 7);
        assert_eq!(builder.get(MAX_CODE_POINT + 1), 0xbad);
        assert_eq!(builder.get(u32::MAX), 0xbad);
    }

    #[test]
    fn test_invalid_arguments() {
        let mut builder = Builder::new(0, 0xbad);
        builder.set(0x41, 5).unwrap();
        let before = builder.clone();

        assert!(builder.set(0x110000, 1).is_err());
        assert!(builder.set_range(0x42, 0x41, 1, true).is_err());
        assert!(builder.set_range(0x10fff0, 0x110000, 1, true).is_err());
        let ls = Range {
            start: 0xd7ff,
            end: 0xd800,
            value: 1,
            lead_surrogate: true,
        };
        assert!(builder.set_range_from(&ls, true).is_err());

        assert_eq!(builder, before);
        assert_eq!(builder.get(0x10fff0), 0);
    }

    #[test]
    fn test_overlapping_ranges_overwrite() {
        let mut builder = Builder::new(0, 0xbad);
        builder.set_range(0x21, 0x7e, 0x5555, true).unwrap();
        builder.set_range(0x72, 0xdc, 3, true).unwrap();
        assert_eq!(builder.get(0x20), 0);
        assert_eq!(builder.get(0x21), 0x5555);
        assert_eq!(builder.get(0x71), 0x5555);
        assert_eq!(builder.get(0x72), 3);
        assert_eq!(builder.get(0xdc), 3);
        assert_eq!(builder.get(0xdd), 0);
    }

    #[test]
    fn test_no_overwrite_is_noop_on_set_values() {
        let mut builder = Builder::new(0, 0xbad);
        builder.set_range(0x1000, 0x2fff, 9, true).unwrap();
        let before = builder.clone();
        builder.set_range(0x1000, 0x2fff, 4, false).unwrap();
        assert_eq!(builder, before);

        builder.set_range(0x0f00, 0x3100, 4, false).unwrap();
        assert_eq!(builder.get(0x0eff), 0);
        assert_eq!(builder.get(0x0f00), 4);
        assert_eq!(builder.get(0x1000), 9);
        assert_eq!(builder.get(0x2fff), 9);
        assert_eq!(builder.get(0x3000), 4);
        assert_eq!(builder.get(0x3101), 0);
    }

    #[test]
    fn test_lead_surrogate_isolation() {
        let mut builder = Builder::new(0, 0xbad);
        builder.set_for_lead_surrogate_code_unit(0xd801, 5000);
        builder.set(0xd801, 6000).unwrap();
        builder.set_range(0x10000, 0x10ffff, 7, true).unwrap();
        assert_eq!(builder.get_from_u16_single_lead(0xd801), 5000);
        assert_eq!(builder.get(0xd801), 6000);
        assert_eq!(builder.get_from_u16_single_lead(0xd800), 0);
        assert_eq!(builder.get(0xd800), 0);

        // Outside of the lead surrogates, both lanes are the same.
        builder.set_for_lead_surrogate_code_unit(0x61, 8);
        assert_eq!(builder.get(0x61), 8);
        assert_eq!(builder.get_from_u16_single_lead(0xdc00), 0);
    }

    #[test]
    fn test_repeat_blocks_copy_on_write() {
        let mut builder = Builder::new(0, 0xbad);
        builder.set_range(0x1000, 0x1fff, 2, true).unwrap();
        builder.set(0x1234, 3).unwrap();
        assert_eq!(builder.get(0x1233), 2);
        assert_eq!(builder.get(0x1234), 3);
        assert_eq!(builder.get(0x1235), 2);
        assert_eq!(builder.get(0x1254), 2);

        builder.set_range(0x1000, 0x1fff, 0, true).unwrap();
        assert_eq!(builder.get(0x1234), 0);
        assert_eq!(builder.iter().filter(|r| !r.lead_surrogate).count(), 1);
    }

    #[test]
    fn test_from_map_copies_lanes() {
        let mut builder = Builder::new(3, 0xbad);
        builder.set_range(0x100, 0x2ff, 4, true).unwrap();
        builder.set(0x10400, 5).unwrap();
        builder.set_for_lead_surrogate_code_unit(0xdbff, 6);
        let trie = builder.freeze32().unwrap();

        let copy = Builder::from_map(&trie);
        assert_eq!(copy, builder);
        assert_eq!(copy.get_from_u16_single_lead(0xdbff), 6);
        assert_eq!(copy.initial_value(), 3);
    }

    #[test]
    fn test_random_against_dense() {
        let mut rng = StdRng::seed_from_u64(0x7472_6965);
        let initial = 0;
        let mut builder = Builder::new(initial, 0xbad);
        let mut dense = vec![initial; CODE_POINT_LIMIT as usize];

        for _ in 0..300 {
            let start = if rng.gen_bool(0.5) {
                rng.gen_range(0..0x3000)
            } else {
                rng.gen_range(0..CODE_POINT_LIMIT)
            };
            let len = if rng.gen_bool(0.7) {
                rng.gen_range(1..0x100)
            } else {
                rng.gen_range(1..0x20000)
            };
            let end = (start + len - 1).min(MAX_CODE_POINT);
            let value = rng.gen_range(0..8);
            let overwrite = rng.gen_bool(0.6);
            builder.set_range(start, end, value, overwrite).unwrap();
            apply_dense(&mut dense, initial, start, end, value, overwrite);
        }
        for _ in 0..500 {
            let c = rng.gen_range(0..CODE_POINT_LIMIT);
            let value = rng.gen_range(0..0x10000);
            builder.set(c, value).unwrap();
            dense[c as usize] = value;
        }

        for (c, &v) in dense.iter().enumerate() {
            assert_eq!(builder.get(c as u32), v, "U+{:04X}", c);
        }
    }
}
