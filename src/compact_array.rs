//! A legacy two-level array keyed by a 16-bit ordinal.
pub mod rle;

use std::collections::HashMap;

use tracing::debug;

use crate::errors::{Result, TrieError};
use crate::{Statistics, TrieValue};

const BLOCK_SHIFT: u32 = 5;
const BLOCK_LENGTH: usize = 1 << BLOCK_SHIFT;
const BLOCK_MASK: usize = BLOCK_LENGTH - 1;

/// Number of ordinals, `0..=0xFFFF`.
pub const ORDINAL_COUNT: usize = 0x10000;

/// Number of entries of the index array.
pub const INDEX_LENGTH: usize = ORDINAL_COUNT >> BLOCK_SHIFT;

/// A sparse array mapping every `u16` ordinal to a value of type `T`.
///
/// The ordinal space is split into blocks of 32 values. [`CompactArray::compact`]
/// folds identical blocks so that the index entries share them; a write into a
/// shared block first gives the block its own copy.
///
/// # Examples
///
/// ```
/// use utrie::CompactArray;
///
/// let mut array = CompactArray::new(0u8);
/// array.set_range(0x3040, 0x309f, 2).unwrap();
/// array.compact(true);
/// assert!(array.is_compact());
/// assert_eq!(array.get(0x3041), 2);
///
/// array.set(0x3041, 3);
/// assert!(!array.is_compact());
/// assert_eq!(array.get(0x3041), 3);
/// assert_eq!(array.get(0x3042), 2);
/// ```
#[derive(Clone)]
pub struct CompactArray<T> {
    index: Vec<u16>,
    values: Vec<T>,
    // True if the block of an index entry is used by that entry only.
    owned: Vec<bool>,
    compact: bool,
}

impl<T> CompactArray<T>
where
    T: TrieValue,
{
    /// Creates a dense array with every ordinal set to `default`.
    pub fn new(default: T) -> Self {
        Self {
            index: (0..INDEX_LENGTH).map(|i| (i << BLOCK_SHIFT) as u16).collect(),
            values: vec![default; ORDINAL_COUNT],
            owned: vec![true; INDEX_LENGTH],
            compact: false,
        }
    }

    /// Creates an array from a compacted index and value array pair, such as those
    /// returned by [`CompactArray::index_array`] and [`CompactArray::value_array`].
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when `index` does not have
    /// [`INDEX_LENGTH`] entries or when an entry points outside of `values`.
    pub fn from_arrays(index: Vec<u16>, values: Vec<T>) -> Result<Self> {
        if index.len() != INDEX_LENGTH {
            return Err(TrieError::malformed("index array must have 2048 entries"));
        }
        if values.len() > ORDINAL_COUNT {
            return Err(TrieError::malformed("value array is longer than the ordinal space"));
        }
        if index
            .iter()
            .any(|&i| usize::from(i) + BLOCK_LENGTH > values.len())
        {
            return Err(TrieError::malformed("index entry points outside of the values"));
        }
        Ok(Self {
            owned: vec![false; INDEX_LENGTH],
            index,
            values,
            compact: true,
        })
    }

    /// Creates an array from the run-length encoded forms produced by
    /// [`CompactArray::to_rle`].
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when either text is malformed.
    pub fn from_rle(index_units: &[u16], value_units: &[u16]) -> Result<Self> {
        Self::from_arrays(rle::decode(index_units)?, rle::decode(value_units)?)
    }

    /// Returns the value of an ordinal.
    #[inline(always)]
    pub fn get(&self, ordinal: u16) -> T {
        let ordinal = usize::from(ordinal);
        let block = usize::from(self.index[ordinal >> BLOCK_SHIFT]);
        self.values[block + (ordinal & BLOCK_MASK)]
    }

    /// Sets the value of an ordinal.
    pub fn set(&mut self, ordinal: u16, value: T) {
        let ordinal = usize::from(ordinal);
        let block = self.own_block(ordinal >> BLOCK_SHIFT);
        self.values[block + (ordinal & BLOCK_MASK)] = value;
        self.compact = false;
    }

    /// Sets the value of every ordinal in `start..=end`.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when `start > end`; the array is left unchanged.
    pub fn set_range(&mut self, start: u16, end: u16, value: T) -> Result<()> {
        if start > end {
            return Err(TrieError::range(u32::from(start), u32::from(end), 0xffff));
        }
        let (start, end) = (usize::from(start), usize::from(end));
        for i in (start >> BLOCK_SHIFT)..=(end >> BLOCK_SHIFT) {
            let first = start.max(i << BLOCK_SHIFT) & BLOCK_MASK;
            let last = end.min((i << BLOCK_SHIFT) | BLOCK_MASK) & BLOCK_MASK;
            let block = self.own_block(i);
            self.values[block + first..=block + last].fill(value);
        }
        self.compact = false;
        Ok(())
    }

    /// Folds blocks with equal contents.
    ///
    /// Identical blocks are always shared, and a block may overlap the tail of the
    /// values placed before it. With `exhaustive`, each block is also searched
    /// for at every position of the values compacted so far, which is slower but
    /// may give a shorter value array. Both modes keep every value unchanged.
    pub fn compact(&mut self, exhaustive: bool) {
        let old_length = self.values.len();
        let mut values: Vec<T> = Vec::with_capacity(old_length.min(ORDINAL_COUNT));
        let mut seen: HashMap<&[T], u16> = HashMap::new();
        let mut index = vec![0; INDEX_LENGTH];

        for (i, entry) in index.iter_mut().enumerate() {
            let offset = usize::from(self.index[i]);
            let block = &self.values[offset..offset + BLOCK_LENGTH];
            if let Some(&moved) = seen.get(block) {
                *entry = moved;
                continue;
            }
            let position = if exhaustive {
                find_overlapping_position(&values, block)
            } else {
                find_tail_overlap(&values, block)
            };
            // The block may lie entirely inside the values placed so far.
            let overlap = (values.len() - position).min(BLOCK_LENGTH);
            if overlap < BLOCK_LENGTH {
                values.extend_from_slice(&block[overlap..]);
            }
            *entry = position as u16;
            seen.insert(block, position as u16);
        }
        drop(seen);

        values.shrink_to_fit();
        self.index = index;
        self.values = values;
        self.owned.fill(false);
        self.compact = true;
        debug!(
            exhaustive,
            old_length,
            new_length = self.values.len(),
            "compacted array"
        );
    }

    /// Checks if no write happened since the last compaction.
    pub const fn is_compact(&self) -> bool {
        self.compact
    }

    /// Returns the index array; each entry is the offset of a block in the value array.
    pub fn index_array(&self) -> &[u16] {
        &self.index
    }

    /// Returns the value array.
    pub fn value_array(&self) -> &[T] {
        &self.values
    }

    /// Encodes the index and value arrays into run-length encoded UTF-16 text.
    pub fn to_rle(&self) -> (Vec<u16>, Vec<u16>) {
        (rle::encode(&self.index), rle::encode(&self.values))
    }

    /// Returns the total amount of bytes of the index and value arrays.
    pub fn io_bytes(&self) -> usize {
        self.index.len() * std::mem::size_of::<u16>() + self.values.len() * T::WIDTH.bytes()
    }

    // Makes the block of index entry `i` writable and returns its offset.
    fn own_block(&mut self, i: usize) -> usize {
        let offset = usize::from(self.index[i]);
        if self.owned[i] {
            return offset;
        }
        let new_offset = self.values.len();
        if new_offset + BLOCK_LENGTH > ORDINAL_COUNT {
            // The offset of a new block would not fit the index.
            self.expand();
            return usize::from(self.index[i]);
        }
        self.values.extend_from_within(offset..offset + BLOCK_LENGTH);
        self.index[i] = new_offset as u16;
        self.owned[i] = true;
        new_offset
    }

    // Returns to the dense form, where every block is owned.
    fn expand(&mut self) {
        let values = (0..=u16::MAX).map(|o| self.get(o)).collect();
        self.values = values;
        for (i, entry) in self.index.iter_mut().enumerate() {
            *entry = (i << BLOCK_SHIFT) as u16;
        }
        self.owned.fill(true);
        debug!("expanded array to its dense form");
    }
}

// First position where `block` matches the values, possibly running past their end.
fn find_overlapping_position<T: PartialEq>(values: &[T], block: &[T]) -> usize {
    (0..values.len())
        .find(|&i| {
            let n = (values.len() - i).min(block.len());
            values[i..i + n] == block[..n]
        })
        .unwrap_or(values.len())
}

// Same as find_overlapping_position, limited to overlaps with the tail.
fn find_tail_overlap<T: PartialEq>(values: &[T], block: &[T]) -> usize {
    let max_overlap = values.len().min(block.len() - 1);
    (1..=max_overlap)
        .rev()
        .find(|&n| values[values.len() - n..] == block[..n])
        .map_or(values.len(), |n| values.len() - n)
}

impl<T> Statistics for CompactArray<T>
where
    T: TrieValue,
{
    fn heap_bytes(&self) -> usize {
        self.index.len() * std::mem::size_of::<u16>()
            + self.values.len() * std::mem::size_of::<T>()
            + self.owned.len() * std::mem::size_of::<bool>()
    }

    fn num_elems(&self) -> usize {
        self.values.len()
    }
}

impl<T> PartialEq for CompactArray<T>
where
    T: TrieValue,
{
    fn eq(&self, other: &Self) -> bool {
        (0..=u16::MAX).all(|o| self.get(o) == other.get(o))
    }
}

impl<T> Eq for CompactArray<T> where T: TrieValue {}

impl<T> core::hash::Hash for CompactArray<T>
where
    T: TrieValue,
{
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        for o in 0..=u16::MAX {
            self.get(o).hash(state);
        }
    }
}

impl<T> core::fmt::Debug for CompactArray<T>
where
    T: TrieValue,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("CompactArray")
            .field("values_length", &self.values.len())
            .field("compact", &self.compact)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn hash_of<H: Hash>(h: &H) -> u64 {
        let mut state = DefaultHasher::new();
        h.hash(&mut state);
        state.finish()
    }

    fn sample() -> CompactArray<u16> {
        let mut array = CompactArray::new(0xffff);
        array.set_range(0x41, 0x5a, 1).unwrap();
        array.set_range(0x3000, 0x4fff, 2).unwrap();
        array.set(0xa5a5, 0xa5a5);
        array.set(0xfffe, 3);
        array
    }

    #[test]
    fn test_dense_get_set() {
        let array = sample();
        assert!(!array.is_compact());
        assert_eq!(array.get(0x40), 0xffff);
        assert_eq!(array.get(0x41), 1);
        assert_eq!(array.get(0x5a), 1);
        assert_eq!(array.get(0x2fff), 0xffff);
        assert_eq!(array.get(0x4fff), 2);
        assert_eq!(array.get(0xfffe), 3);
        assert_eq!(array.get(0xffff), 0xffff);
        assert_eq!(array.num_elems(), ORDINAL_COUNT);
    }

    #[test]
    fn test_compact_keeps_values() {
        let dense = sample();
        for exhaustive in [false, true] {
            let mut array = dense.clone();
            array.compact(exhaustive);
            assert!(array.is_compact());
            assert!(array.value_array().len() < 6 * 32);
            assert!(array.io_bytes() <= dense.io_bytes());
            assert_eq!(array, dense);
            assert_eq!(hash_of(&array), hash_of(&dense));
        }
    }

    #[test]
    fn test_compact_modes_agree() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut dense = CompactArray::new(0u8);
        for _ in 0..200 {
            let start = rng.gen_range(0..0xff00);
            let end = start + rng.gen_range(0..0x80);
            dense.set_range(start, end, rng.gen_range(0..3)).unwrap();
        }
        let mut quick = dense.clone();
        quick.compact(false);
        let mut thorough = dense.clone();
        thorough.compact(true);
        assert!(quick.value_array().len() < ORDINAL_COUNT);
        assert!(thorough.value_array().len() < ORDINAL_COUNT);
        assert_eq!(quick, dense);
        assert_eq!(thorough, dense);
    }

    #[test]
    fn test_exhaustive_block_inside_values() {
        let mut array = CompactArray::new(0u16);
        for o in 0..64 {
            array.set(o, o);
        }
        // Block 2 holds 8..=39, found inside blocks 0 and 1.
        for o in 64..96 {
            array.set(o, o - 56);
        }
        let dense = array.clone();
        array.compact(true);

        assert_eq!(array.index_array()[2], 8);
        assert_eq!(array.value_array().len(), 96);
        assert_eq!(array, dense);
        assert_eq!(array.get(64), 8);
        assert_eq!(array.get(95), 39);
        assert_eq!(array.get(96), 0);
    }

    #[test]
    fn test_random_rounds_against_dense() {
        let mut rng = StdRng::seed_from_u64(0x636f_6d70);
        let mut array = CompactArray::new(0u32);
        let mut dense = vec![0u32; ORDINAL_COUNT];

        for round in 0..12 {
            for _ in 0..8 {
                let start = rng.gen_range(0..0xfe00);
                let end = start + rng.gen_range(0..0x200);
                let value = rng.gen_range(0..4);
                array.set_range(start, end, value).unwrap();
                dense[usize::from(start)..=usize::from(end)].fill(value);
            }
            // Shifted copies of an increasing run, so that blocks match inside
            // earlier ones at unaligned positions.
            let base = rng.gen_range(0..0x7f0u16) << 5;
            let shift = rng.gen_range(1..32);
            for o in base..base + 64 {
                let value = u32::from(o - base);
                array.set(o, value);
                dense[usize::from(o)] = value;
            }
            for o in base + 64..base + 96 {
                let value = u32::from(o - base - 64 + shift);
                array.set(o, value);
                dense[usize::from(o)] = value;
            }

            array.compact(round % 2 == 0);
            assert!(array.is_compact());
            for (o, &v) in dense.iter().enumerate() {
                assert_eq!(array.get(o as u16), v, "round {} ordinal {:04X}", round, o);
            }

            let (index_units, value_units) = array.to_rle();
            let copy = CompactArray::<u32>::from_rle(&index_units, &value_units).unwrap();
            assert_eq!(copy, array);
        }
    }

    #[test]
    fn test_copy_on_write() {
        let mut array = CompactArray::new(0u32);
        array.set_range(0x1000, 0x1fff, 9).unwrap();
        array.compact(false);
        let shared = array.value_array().len();

        array.set(0x1234, 10);
        assert!(!array.is_compact());
        assert_eq!(array.value_array().len(), shared + 32);
        assert_eq!(array.get(0x1234), 10);
        assert_eq!(array.get(0x1233), 9);
        // Other users of the shared block are untouched.
        assert_eq!(array.get(0x1334), 9);
        assert_eq!(array.get(0x0234), 0);

        // A second write into the same block does not copy again.
        array.set(0x1235, 11);
        assert_eq!(array.value_array().len(), shared + 32);
    }

    #[test]
    fn test_copy_on_write_expands() {
        let mut array = CompactArray::new(0u8);
        array.compact(true);
        assert_eq!(array.value_array().len(), 32);
        for o in (0..=u16::MAX).step_by(32) {
            array.set(o, (o >> 5) as u8);
        }
        assert_eq!(array.value_array().len(), ORDINAL_COUNT);
        for o in (0..=u16::MAX).step_by(32) {
            assert_eq!(array.get(o), (o >> 5) as u8);
            assert_eq!(array.get(o + 1), 0);
        }
    }

    #[test]
    fn test_from_arrays() {
        let mut array = sample();
        array.compact(true);
        let copy =
            CompactArray::from_arrays(array.index_array().to_vec(), array.value_array().to_vec())
                .unwrap();
        assert_eq!(copy, array);
        assert!(copy.is_compact());

        assert!(CompactArray::<u8>::from_arrays(vec![0; 10], vec![0; 32]).is_err());
        assert!(CompactArray::<u8>::from_arrays(vec![1; INDEX_LENGTH], vec![0; 32]).is_err());
        assert!(CompactArray::<u8>::from_arrays(vec![0; INDEX_LENGTH], vec![0; 31]).is_err());
    }

    #[test]
    fn test_rle_roundtrip() {
        let mut array = sample();
        array.compact(false);
        let (index_units, value_units) = array.to_rle();
        let copy = CompactArray::<u16>::from_rle(&index_units, &value_units).unwrap();
        assert_eq!(copy, array);
        assert_eq!(copy.value_array(), array.value_array());

        assert!(CompactArray::<u16>::from_rle(&value_units, &index_units).is_err());
    }

    #[test]
    fn test_set_range_invalid() {
        let mut array = CompactArray::new(0u8);
        assert!(array.set_range(2, 1, 5).is_err());
        assert_eq!(array, CompactArray::new(0u8));
        array.set_range(0xffff, 0xffff, 5).unwrap();
        assert_eq!(array.get(0xffff), 5);
    }

    #[test]
    fn test_equality_ignores_layout() {
        let mut a = CompactArray::new(1u32);
        let mut b = CompactArray::new(1u32);
        a.set(5, 2);
        b.compact(true);
        b.set(5, 2);
        assert_eq!(a, b);
        assert_ne!(a.value_array().len(), b.value_array().len());
        b.set(6, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_overlap_helpers() {
        assert_eq!(find_tail_overlap(&[1, 2, 3], &[2, 3, 4, 5]), 1);
        assert_eq!(find_tail_overlap(&[1, 2, 3], &[4, 5]), 3);
        assert_eq!(find_overlapping_position(&[1, 2, 3, 4, 5], &[2, 3]), 1);
        assert_eq!(find_overlapping_position(&[1, 2, 3], &[3, 4]), 2);
        assert_eq!(find_overlapping_position::<u8>(&[], &[3, 4]), 0);
    }
}
