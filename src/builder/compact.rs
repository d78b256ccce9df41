//! Compaction of a builder snapshot into a frozen trie.
use std::collections::HashMap;
use tracing::debug;

use super::{Builder, INDEX_1_LENGTH};
use crate::errors::{Result, TrieError};
use crate::utils::FromU32;
use crate::{CodePointMap, FrozenTrie, TrieValue};
use crate::{
    CODE_POINT_LIMIT, CP_PER_INDEX_1_ENTRY, DATA_BLOCK_LENGTH, DATA_GRANULARITY,
    INDEX_2_BLOCK_LENGTH, INDEX_2_BMP_LENGTH, INDEX_SHIFT, LATIN1_DATA_LENGTH, MAX_CODE_POINT,
    OMITTED_BMP_INDEX_1_LENGTH, SHIFT_1, SHIFT_1_2, SHIFT_2,
};

// Largest offset or length stored in a 16-bit header field or index entry.
const MAX_UNSHIFTED: usize = 0xffff;

impl Builder {
    /// Compacts the arrays in place and returns the high start, the first code
    /// point of the final run of equal values up to U+10FFFF.
    pub(super) fn compact_trie(&mut self) -> u32 {
        let mut high_value = self.get(MAX_CODE_POINT);
        let high_start = self.find_high_start(high_value);
        let high_start = (high_start + (CP_PER_INDEX_1_ENTRY - 1)) & !(CP_PER_INDEX_1_ENTRY - 1);
        if high_start == CODE_POINT_LIMIT {
            high_value = self.error_value;
        }
        debug!(high_start, high_value, "found high start");

        // Values at and above the high start are not stored.
        if high_start < CODE_POINT_LIMIT {
            let supp_high_start = high_start.max(0x10000);
            self.set_range_unchecked(supp_high_start, MAX_CODE_POINT, self.initial_value, true);
        }

        self.compact_data();
        if high_start > 0x10000 {
            self.compact_index2(high_start);
        } else {
            debug!("index-2 compaction skipped, no supplementary blocks below the high start");
        }

        // The high value is stored after the data, followed by padding.
        let padded = (self.data_length + 1 + DATA_GRANULARITY - 1) & !(DATA_GRANULARITY - 1);
        if self.data.len() < padded {
            self.data.resize(padded, 0);
        }
        self.data[self.data_length] = high_value;
        self.data[self.data_length + 1..padded].fill(self.initial_value);
        self.data_length = padded;

        high_start
    }

    fn find_high_start(&self, high_value: u32) -> u32 {
        let (mut prev_i2_block, mut prev_block) = if high_value == self.initial_value {
            (Some(self.index2_null_offset), Some(self.data_null_offset))
        } else {
            (None, None)
        };

        let mut c = CODE_POINT_LIMIT;
        let mut i1 = INDEX_1_LENGTH;
        while c > 0 {
            i1 -= 1;
            let i2_block = usize::from_u32(self.index1[i1]);
            if Some(i2_block) == prev_i2_block {
                // The index-2 block is the same as the previous one, and filled with high_value.
                c -= CP_PER_INDEX_1_ENTRY;
                continue;
            }
            prev_i2_block = Some(i2_block);
            if i2_block == self.index2_null_offset {
                if high_value != self.initial_value {
                    return c;
                }
                c -= CP_PER_INDEX_1_ENTRY;
                continue;
            }
            for i2 in (0..INDEX_2_BLOCK_LENGTH).rev() {
                let block = usize::from_u32(self.index2[i2_block + i2]);
                if Some(block) == prev_block {
                    c -= DATA_BLOCK_LENGTH as u32;
                    continue;
                }
                prev_block = Some(block);
                if block == self.data_null_offset {
                    if high_value != self.initial_value {
                        return c;
                    }
                    c -= DATA_BLOCK_LENGTH as u32;
                    continue;
                }
                for j in (0..DATA_BLOCK_LENGTH).rev() {
                    if self.data[block + j] != high_value {
                        return c;
                    }
                    c -= 1;
                }
            }
        }
        0
    }

    // Folds identical data blocks and overlaps the end of each block with the
    // start of the next one. The linear Latin-1 blocks stay in place.
    fn compact_data(&mut self) {
        let mut seen: HashMap<Vec<u32>, usize> = HashMap::new();
        let mut new_start = LATIN1_DATA_LENGTH;
        for start in (0..new_start).step_by(DATA_BLOCK_LENGTH) {
            self.map[start >> SHIFT_2] = start as i32;
            seen.entry(self.data[start..start + DATA_BLOCK_LENGTH].to_vec())
                .or_insert(start);
        }

        let old_length = self.data_length;
        let mut start = new_start;
        while start < self.data_length {
            // Skip blocks that are not used.
            if self.map[start >> SHIFT_2] <= 0 {
                start += DATA_BLOCK_LENGTH;
                continue;
            }

            let block = self.data[start..start + DATA_BLOCK_LENGTH].to_vec();
            if let Some(&moved) = seen.get(&block) {
                self.map[start >> SHIFT_2] = moved as i32;
                start += DATA_BLOCK_LENGTH;
                continue;
            }

            let mut overlap = DATA_BLOCK_LENGTH - DATA_GRANULARITY;
            while overlap > 0
                && self.data[new_start - overlap..new_start] != self.data[start..start + overlap]
            {
                overlap -= DATA_GRANULARITY;
            }

            let moved = new_start - overlap;
            self.map[start >> SHIFT_2] = moved as i32;
            if overlap > 0 || new_start < start {
                self.data
                    .copy_within(start + overlap..start + DATA_BLOCK_LENGTH, new_start);
                new_start += DATA_BLOCK_LENGTH - overlap;
            } else {
                new_start = start + DATA_BLOCK_LENGTH;
            }
            seen.insert(block, moved);
            start += DATA_BLOCK_LENGTH;
        }

        // Moves the index-2 entries to the new block positions, skipping the gap.
        let mut i = 0;
        while i < self.index2_length {
            if i == super::INDEX_GAP_OFFSET {
                i += super::INDEX_GAP_LENGTH;
                continue;
            }
            let block = usize::from_u32(self.index2[i]);
            self.index2[i] = self.map[block >> SHIFT_2] as u32;
            i += 1;
        }
        self.data_null_offset = self.map[self.data_null_offset >> SHIFT_2] as usize;

        while new_start & (DATA_GRANULARITY - 1) != 0 {
            self.data[new_start] = self.initial_value;
            new_start += 1;
        }
        self.data_length = new_start;
        debug!(
            old_length,
            new_length = self.data_length,
            data_null_offset = self.data_null_offset,
            "compacted data"
        );
    }

    // Same as compact_data for the supplementary index-2 blocks. Compacted blocks
    // start after the index-1 entries up to the high start.
    fn compact_index2(&mut self, high_start: u32) {
        let mut seen: HashMap<Vec<u32>, usize> = HashMap::new();
        let mut new_start = INDEX_2_BMP_LENGTH;
        for start in (0..new_start).step_by(INDEX_2_BLOCK_LENGTH) {
            self.map[start >> SHIFT_1_2] = start as i32;
            if start + INDEX_2_BLOCK_LENGTH <= INDEX_2_BMP_LENGTH {
                seen.entry(self.index2[start..start + INDEX_2_BLOCK_LENGTH].to_vec())
                    .or_insert(start);
            }
        }

        new_start += usize::from_u32((high_start - 0x10000) >> SHIFT_1);

        let old_length = self.index2_length;
        let mut start = super::INDEX_2_NULL_OFFSET;
        while start < self.index2_length {
            let block = self.index2[start..start + INDEX_2_BLOCK_LENGTH].to_vec();
            if let Some(&moved) = seen.get(&block) {
                self.map[start >> SHIFT_1_2] = moved as i32;
                start += INDEX_2_BLOCK_LENGTH;
                continue;
            }

            let mut overlap = INDEX_2_BLOCK_LENGTH - 1;
            while overlap > 0
                && self.index2[new_start - overlap..new_start]
                    != self.index2[start..start + overlap]
            {
                overlap -= 1;
            }

            let moved = new_start - overlap;
            self.map[start >> SHIFT_1_2] = moved as i32;
            if overlap > 0 || new_start < start {
                self.index2
                    .copy_within(start + overlap..start + INDEX_2_BLOCK_LENGTH, new_start);
                new_start += INDEX_2_BLOCK_LENGTH - overlap;
            } else {
                new_start = start + INDEX_2_BLOCK_LENGTH;
            }
            seen.insert(block, moved);
            start += INDEX_2_BLOCK_LENGTH;
        }

        for i1 in self.index1.iter_mut() {
            *i1 = self.map[usize::from_u32(*i1) >> SHIFT_1_2] as u32;
        }
        self.index2_null_offset = self.map[self.index2_null_offset >> SHIFT_1_2] as usize;
        self.index2_length = new_start;
        debug!(
            old_length,
            new_length = self.index2_length,
            index2_null_offset = self.index2_null_offset,
            "compacted index-2 table"
        );
    }

    /// Converts the compacted arrays into a frozen trie with values of type `T`.
    pub(super) fn release_frozen<T>(self, high_start: u32) -> Result<FrozenTrie<T>>
    where
        T: TrieValue,
    {
        let index1_length = if high_start > 0x10000 {
            usize::from_u32((high_start - 0x10000) >> SHIFT_1)
        } else {
            0
        };
        let index_length = if index1_length == 0 {
            INDEX_2_BMP_LENGTH
        } else {
            self.index2_length
        };

        if index_length > MAX_UNSHIFTED {
            return Err(TrieError::scale("index length", MAX_UNSHIFTED as u32));
        }
        if self.data_null_offset > MAX_UNSHIFTED {
            return Err(TrieError::scale("data null offset", MAX_UNSHIFTED as u32));
        }
        if self.data_length > MAX_UNSHIFTED << INDEX_SHIFT {
            return Err(TrieError::scale("data length", (MAX_UNSHIFTED << INDEX_SHIFT) as u32));
        }

        let narrow = |v: u32| T::try_from_u32(v).ok_or_else(|| TrieError::width(v, T::WIDTH.bits()));
        let error_value = narrow(self.error_value)?;
        let initial_value = narrow(self.initial_value)?;
        let data = self.data[..self.data_length]
            .iter()
            .map(|&v| narrow(v))
            .collect::<Result<Vec<T>>>()?;

        let shifted = |i2: &u32| (i2 >> INDEX_SHIFT) as u16;
        let mut index = Vec::with_capacity(index_length);
        index.extend(self.index2[..INDEX_2_BMP_LENGTH].iter().map(shifted));
        if index1_length != 0 {
            let index2_offset = INDEX_2_BMP_LENGTH + index1_length;
            index.extend(
                self.index1[OMITTED_BMP_INDEX_1_LENGTH..OMITTED_BMP_INDEX_1_LENGTH + index1_length]
                    .iter()
                    .map(|&i1| i1 as u16),
            );
            index.extend(self.index2[index2_offset..self.index2_length].iter().map(shifted));
        }

        let index2_null_offset = if index1_length == 0 {
            0xffff
        } else {
            self.index2_null_offset as u16
        };

        debug!(
            index_length = index.len(),
            data_length = data.len(),
            bits = T::WIDTH.bits(),
            "froze trie"
        );

        Ok(FrozenTrie {
            high_value_index: data.len() - DATA_GRANULARITY,
            index,
            data,
            index2_null_offset,
            data_null_offset: self.data_null_offset as u32,
            high_start,
            initial_value,
            error_value,
        })
    }
}
