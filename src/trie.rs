//! A frozen, compacted code point trie.
pub mod iter;
#[cfg(feature = "units-iter")]
pub mod units;

use std::io::{Read, Write};

use crate::errors::{Result, TrieError};
use crate::format::{self, DataInfo, TrieHeader, DATA_HEADER_SIZE, TRIE_FORMAT_ID, TRIE_HEADER_SIZE};
use crate::utils::{pack_uint, ByteReader, FromU32};
use crate::{is_lead_surrogate, CodePointMap, Statistics, TrieValue, ValueWidth};
use crate::{
    CODE_POINT_LIMIT, DATA_BLOCK_LENGTH, DATA_GRANULARITY, DATA_MASK, INDEX_1_OFFSET,
    INDEX_2_BLOCK_LENGTH, INDEX_2_BMP_LENGTH, INDEX_2_MASK, INDEX_SHIFT, LATIN1_DATA_LENGTH,
    LSCP_INDEX_2_OFFSET, MAX_CODE_POINT, OMITTED_BMP_INDEX_1_LENGTH, SHIFT_1, SHIFT_2,
};

/// An immutable trie produced by [`Builder::freeze`](crate::Builder::freeze).
///
/// Values are stored as `T`, one of `u8`, `u16` or `u32`.
///
/// The index array holds, in order,
///
/// - the BMP index-2 table with 2048 entries for `U+0000..U+FFFF`, where the entries
///   for `U+D800..U+DBFF` serve the lead surrogate lane,
/// - 32 index-2 entries for the lead surrogate code points,
/// - the index-1 table for supplementary code points below the high start, and
/// - the compacted supplementary index-2 blocks.
///
/// Index-2 entries are data offsets shifted right by two bits. Values of the
/// code points from the high start up to U+10FFFF are all the same and are not
/// indexed.
#[derive(Clone)]
pub struct FrozenTrie<T> {
    pub(crate) index: Vec<u16>,
    pub(crate) data: Vec<T>,
    pub(crate) index2_null_offset: u16,
    pub(crate) data_null_offset: u32,
    pub(crate) high_start: u32,
    pub(crate) high_value_index: usize,
    pub(crate) initial_value: T,
    pub(crate) error_value: T,
}

impl<T> FrozenTrie<T>
where
    T: TrieValue,
{
    /// Returns the value for a code point in the storage type.
    ///
    /// Values of code points greater than [`MAX_CODE_POINT`](crate::MAX_CODE_POINT)
    /// are the error value.
    #[inline(always)]
    pub fn get_value(&self, code_point: u32) -> T {
        if code_point < 0x10000 || code_point < self.high_start {
            self.data[self.block_offset(code_point) + usize::from_u32(code_point & DATA_MASK)]
        } else if code_point <= MAX_CODE_POINT {
            self.data[self.high_value_index]
        } else {
            self.error_value
        }
    }

    /// Returns the value for a UTF-16 code unit in the storage type, reading the
    /// lead surrogate lane for `0xD800..=0xDBFF`.
    #[inline(always)]
    pub fn get_value_from_u16_single_lead(&self, code_unit: u16) -> T {
        let i2 = self.index[usize::from(code_unit) >> SHIFT_2];
        self.data[(usize::from(i2) << INDEX_SHIFT) + (usize::from(code_unit) & DATA_MASK as usize)]
    }

    /// Returns the value for a Latin-1 character, which are stored linearly
    /// at the start of the data array.
    ///
    /// # Examples
    ///
    /// ```
    /// use utrie::Builder;
    ///
    /// let mut builder = Builder::new(0, 0xff);
    /// builder.set_range(0x30, 0x39, 1, true).unwrap();
    /// let trie = builder.freeze::<u8>().unwrap();
    ///
    /// assert_eq!(trie.latin1_linear_value(b'7'), 1);
    /// assert_eq!(trie.latin1_linear_value(b'a'), 0);
    /// ```
    #[inline(always)]
    pub fn latin1_linear_value(&self, c: u8) -> T {
        self.data[usize::from(c)]
    }

    /// Returns the first code point from which all values up to U+10FFFF are the same.
    ///
    /// Only meaningful for supplementary code points; the BMP is always fully indexed.
    pub const fn high_start(&self) -> u32 {
        self.high_start
    }

    /// Returns the storage width of the values.
    pub const fn value_width(&self) -> ValueWidth {
        T::WIDTH
    }

    /// Returns the total amount of bytes to serialize the data structure.
    pub fn io_bytes(&self) -> usize {
        DATA_HEADER_SIZE
            + TRIE_HEADER_SIZE
            + self.index.len() * 2
            + self.data.len() * T::WIDTH.bytes()
    }

    /// Serializes the data structure into a [`Vec`] with a default [`DataInfo`].
    pub fn serialize_to_vec(&self) -> Vec<u8> {
        self.serialize_with_info(&DataInfo::default())
    }

    /// Serializes the data structure into a [`Vec`], taking the byte order and
    /// versions from `info`.
    ///
    /// # Examples
    ///
    /// ```
    /// use utrie::format::DataInfo;
    /// use utrie::{Builder, FrozenTrie};
    ///
    /// let trie = Builder::new(0, 0xbad).freeze32().unwrap();
    /// let info = DataInfo {
    ///     big_endian: true,
    ///     data_version: [3, 1, 0, 0],
    ///     ..DataInfo::default()
    /// };
    /// let bytes = trie.serialize_with_info(&info);
    ///
    /// let accept = |v: &[u8; 4]| v[0] >= 3;
    /// assert!(FrozenTrie::<u32>::deserialize_from_slice_with(&bytes, accept).is_ok());
    /// let accept = |v: &[u8; 4]| v[0] == 2;
    /// assert!(FrozenTrie::<u32>::deserialize_from_slice_with(&bytes, accept).is_err());
    /// ```
    pub fn serialize_with_info(&self, info: &DataInfo) -> Vec<u8> {
        let be = info.big_endian;
        let mut buf = Vec::with_capacity(self.io_bytes());
        format::write_header(&mut buf, info, T::WIDTH);
        TrieHeader {
            width: T::WIDTH,
            index_length: self.index.len() as u16,
            shifted_data_length: (self.data.len() >> INDEX_SHIFT) as u16,
            index2_null_offset: self.index2_null_offset,
            data_null_offset: self.data_null_offset as u16,
            shifted_high_start: (self.high_start >> SHIFT_1) as u16,
            error_value: self.error_value.to_u32(),
        }
        .write(&mut buf, be);
        for &i in &self.index {
            pack_uint(&mut buf, u32::from(i), 2, be);
        }
        for &v in &self.data {
            pack_uint(&mut buf, v.to_u32(), T::WIDTH.bytes(), be);
        }
        buf
    }

    /// Serializes the data structure into a writer and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when writing fails.
    pub fn serialize_into<W>(&self, mut wtr: W) -> Result<usize>
    where
        W: Write,
    {
        let bytes = self.serialize_to_vec();
        wtr.write_all(&bytes)?;
        Ok(bytes.len())
    }

    /// Deserializes the data structure from a given byte slice, accepting any data version.
    ///
    /// # Returns
    ///
    /// A tuple of the data structure and the slice not used for the deserialization.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when the bytes are not a well-formed trie with
    /// values of type `T`.
    pub fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        let (header, mut rdr) = read_trie_header(source, None)?;
        let trie = Self::read_body(&header, &mut rdr)?;
        Ok((trie, rdr.remaining()))
    }

    /// Same as [`FrozenTrie::deserialize_from_slice`], but the data version must be
    /// accepted by `accept`.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when `accept` rejects the data version, or
    /// when the bytes are malformed.
    pub fn deserialize_from_slice_with<F>(source: &[u8], accept: F) -> Result<(Self, &[u8])>
    where
        F: Fn(&[u8; 4]) -> bool,
    {
        let (header, mut rdr) = read_trie_header(source, Some(&accept))?;
        let trie = Self::read_body(&header, &mut rdr)?;
        Ok((trie, rdr.remaining()))
    }

    /// Deserializes the data structure from a reader, consuming it to the end.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when reading fails or the bytes are malformed.
    pub fn deserialize_from_reader<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut bytes = vec![];
        rdr.read_to_end(&mut bytes)?;
        Self::deserialize_from_slice(&bytes).map(|(trie, _)| trie)
    }

    fn read_body(header: &TrieHeader, rdr: &mut ByteReader) -> Result<Self> {
        if header.width != T::WIDTH {
            return Err(TrieError::malformed("value width does not match the value type"));
        }

        let index_length = usize::from(header.index_length);
        let data_length = usize::from(header.shifted_data_length) << INDEX_SHIFT;
        let data_null_offset = usize::from(header.data_null_offset);
        let high_start = u32::from(header.shifted_high_start) << SHIFT_1;
        if high_start > CODE_POINT_LIMIT {
            return Err(TrieError::malformed("high start is out of range"));
        }
        let index1_length = if high_start > 0x10000 {
            usize::from_u32((high_start - 0x10000) >> SHIFT_1)
        } else {
            0
        };
        let index2_offset = INDEX_1_OFFSET + index1_length;
        if index_length < index2_offset || (index1_length == 0 && index_length != INDEX_2_BMP_LENGTH) {
            return Err(TrieError::malformed("inconsistent index length"));
        }
        if data_length < LATIN1_DATA_LENGTH + DATA_GRANULARITY
            || data_null_offset + DATA_BLOCK_LENGTH > data_length
        {
            return Err(TrieError::malformed("inconsistent data length"));
        }
        let error_value = T::try_from_u32(header.error_value)
            .ok_or_else(|| TrieError::malformed("error value does not fit the value width"))?;

        let mut index = Vec::with_capacity(index_length);
        for _ in 0..index_length {
            index.push(rdr.read_u16()?);
        }
        let mut data = Vec::with_capacity(data_length);
        for _ in 0..data_length {
            let v = rdr.read_uint(T::WIDTH.bytes())?;
            data.push(T::try_from_u32(v).ok_or_else(|| TrieError::malformed("value overflow"))?);
        }

        // Every lookup must stay within the arrays.
        let in_data = |i2: &u16| (usize::from(*i2) << INDEX_SHIFT) + DATA_BLOCK_LENGTH <= data_length;
        if !index[..INDEX_2_BMP_LENGTH].iter().all(in_data)
            || !index[index2_offset..].iter().all(in_data)
        {
            return Err(TrieError::malformed("index-2 entry points outside of the data"));
        }
        for &i1 in &index[INDEX_1_OFFSET..index2_offset] {
            let i1 = usize::from(i1);
            let in_bmp = i1 + INDEX_2_BLOCK_LENGTH <= INDEX_2_BMP_LENGTH;
            if !(in_bmp || (i1 >= index2_offset && i1 + INDEX_2_BLOCK_LENGTH <= index_length)) {
                return Err(TrieError::malformed("index-1 entry points outside of the index-2 table"));
            }
        }

        Ok(Self {
            initial_value: data[data_null_offset],
            high_value_index: data_length - DATA_GRANULARITY,
            index,
            data,
            index2_null_offset: header.index2_null_offset,
            data_null_offset: data_null_offset as u32,
            high_start,
            error_value,
        })
    }

    // Offset of the data block for `code_point`, which is in the BMP or below the high start.
    #[inline(always)]
    fn block_offset(&self, code_point: u32) -> usize {
        let i2 = if code_point < 0x10000 {
            if is_lead_surrogate(code_point) {
                LSCP_INDEX_2_OFFSET + usize::from_u32((code_point - 0xd800) >> SHIFT_2)
            } else {
                usize::from_u32(code_point >> SHIFT_2)
            }
        } else {
            let i1 = INDEX_1_OFFSET - OMITTED_BMP_INDEX_1_LENGTH + usize::from_u32(code_point >> SHIFT_1);
            usize::from(self.index[i1]) + usize::from_u32((code_point >> SHIFT_2) & INDEX_2_MASK)
        };
        usize::from(self.index[i2]) << INDEX_SHIFT
    }
}

fn read_trie_header<'a>(
    source: &'a [u8],
    accept: Option<&dyn Fn(&[u8; 4]) -> bool>,
) -> Result<(TrieHeader, ByteReader<'a>)> {
    let (info, width, body) = format::read_header(source, TRIE_FORMAT_ID, accept)?;
    let mut rdr = ByteReader::new(body, info.big_endian);
    let header = TrieHeader::read(&mut rdr)?;
    if header.width != width {
        return Err(TrieError::malformed("value widths in the headers disagree"));
    }
    Ok((header, rdr))
}

/// Returns the value width of a serialized trie without decoding it.
///
/// # Errors
///
/// [`TrieError`] will be returned when the headers are malformed.
///
/// # Examples
///
/// ```
/// use utrie::{trie, Builder, ValueWidth};
///
/// let bytes = Builder::new(0, 0).freeze::<u8>().unwrap().serialize_to_vec();
/// assert_eq!(trie::peek_value_width(&bytes).unwrap(), ValueWidth::Bits8);
/// ```
pub fn peek_value_width(source: &[u8]) -> Result<ValueWidth> {
    read_trie_header(source, None).map(|(header, _)| header.width)
}

impl<T> CodePointMap for FrozenTrie<T>
where
    T: TrieValue,
{
    #[inline]
    fn get(&self, code_point: u32) -> u32 {
        self.get_value(code_point).to_u32()
    }

    #[inline]
    fn get_from_u16_single_lead(&self, code_unit: u16) -> u32 {
        self.get_value_from_u16_single_lead(code_unit).to_u32()
    }

    fn initial_value(&self) -> u32 {
        self.initial_value.to_u32()
    }

    fn error_value(&self) -> u32 {
        self.error_value.to_u32()
    }

    // Scans block by block, skipping repeats of a block already found uniform.
    fn range_end(&self, start: u32, limit: u32, value: u32) -> u32 {
        let mut prev_block = None;
        let mut c = start;
        while c < limit {
            if c >= 0x10000 && c >= self.high_start {
                return if self.data[self.high_value_index].to_u32() == value {
                    limit - 1
                } else {
                    c - 1
                };
            }
            let block = self.block_offset(c);
            let block_limit = ((c | DATA_MASK) + 1).min(limit);
            if prev_block != Some(block) {
                let first = usize::from_u32(c & DATA_MASK);
                let last = usize::from_u32((block_limit - 1) & DATA_MASK);
                let slots = &self.data[block + first..=block + last];
                if let Some(i) = slots.iter().position(|v| v.to_u32() != value) {
                    return c + i as u32 - 1;
                }
                if first == 0 && last == DATA_MASK as usize {
                    prev_block = Some(block);
                }
            }
            c = block_limit;
        }
        limit - 1
    }
}

impl<T> Statistics for FrozenTrie<T>
where
    T: TrieValue,
{
    fn heap_bytes(&self) -> usize {
        self.index.len() * std::mem::size_of::<u16>() + self.data.len() * std::mem::size_of::<T>()
    }

    fn num_elems(&self) -> usize {
        self.data.len()
    }
}

impl<T, M> PartialEq<M> for FrozenTrie<T>
where
    T: TrieValue,
    M: CodePointMap,
{
    fn eq(&self, other: &M) -> bool {
        crate::utils::same_contents(self, other)
    }
}

impl<T> Eq for FrozenTrie<T> where T: TrieValue {}

impl<T> core::hash::Hash for FrozenTrie<T>
where
    T: TrieValue,
{
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        crate::utils::hash_contents(self, state);
    }
}

impl<T> core::fmt::Debug for FrozenTrie<T>
where
    T: TrieValue,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("FrozenTrie")
            .field("value_width", &T::WIDTH)
            .field("index_length", &self.index.len())
            .field("data_length", &self.data.len())
            .field("high_start", &self.high_start)
            .field("initial_value", &self.initial_value)
            .field("error_value", &self.error_value)
            .finish()
    }
}

/// A frozen trie of any value width, as found in serialized data.
#[derive(Clone, Debug)]
pub enum AnyTrie {
    /// 8-bit values.
    Bits8(FrozenTrie<u8>),
    /// 16-bit values.
    Bits16(FrozenTrie<u16>),
    /// 32-bit values.
    Bits32(FrozenTrie<u32>),
}

macro_rules! dispatch {
    ($any:expr, $trie:ident => $body:expr) => {
        match $any {
            AnyTrie::Bits8($trie) => $body,
            AnyTrie::Bits16($trie) => $body,
            AnyTrie::Bits32($trie) => $body,
        }
    };
}

impl AnyTrie {
    /// Deserializes a trie of the width declared in its header.
    ///
    /// # Returns
    ///
    /// A tuple of the data structure and the slice not used for the deserialization.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when the bytes are malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use utrie::{AnyTrie, Builder, CodePointMap, ValueWidth};
    ///
    /// let mut builder = Builder::new(0, 0xbad);
    /// builder.set(0x10000, 0x12345).unwrap();
    /// let bytes = builder.freeze32().unwrap().serialize_to_vec();
    ///
    /// let (trie, _) = AnyTrie::deserialize_from_slice(&bytes).unwrap();
    /// assert_eq!(trie.value_width(), ValueWidth::Bits32);
    /// assert_eq!(trie.get(0x10000), 0x12345);
    /// ```
    pub fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        Self::deserialize(source, None)
    }

    /// Same as [`AnyTrie::deserialize_from_slice`], but the data version must be
    /// accepted by `accept`.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when `accept` rejects the data version, or
    /// when the bytes are malformed.
    pub fn deserialize_from_slice_with<F>(source: &[u8], accept: F) -> Result<(Self, &[u8])>
    where
        F: Fn(&[u8; 4]) -> bool,
    {
        Self::deserialize(source, Some(&accept))
    }

    fn deserialize<'a>(
        source: &'a [u8],
        accept: Option<&dyn Fn(&[u8; 4]) -> bool>,
    ) -> Result<(Self, &'a [u8])> {
        let (header, mut rdr) = read_trie_header(source, accept)?;
        let trie = match header.width {
            ValueWidth::Bits8 => Self::Bits8(FrozenTrie::read_body(&header, &mut rdr)?),
            ValueWidth::Bits16 => Self::Bits16(FrozenTrie::read_body(&header, &mut rdr)?),
            ValueWidth::Bits32 => Self::Bits32(FrozenTrie::read_body(&header, &mut rdr)?),
        };
        Ok((trie, rdr.remaining()))
    }

    /// Returns the storage width of the values.
    pub const fn value_width(&self) -> ValueWidth {
        match self {
            Self::Bits8(_) => ValueWidth::Bits8,
            Self::Bits16(_) => ValueWidth::Bits16,
            Self::Bits32(_) => ValueWidth::Bits32,
        }
    }

    /// Returns the total amount of bytes to serialize the data structure.
    pub fn io_bytes(&self) -> usize {
        dispatch!(self, trie => trie.io_bytes())
    }

    /// Serializes the data structure into a [`Vec`] with a default [`DataInfo`].
    pub fn serialize_to_vec(&self) -> Vec<u8> {
        dispatch!(self, trie => trie.serialize_to_vec())
    }
}

impl CodePointMap for AnyTrie {
    #[inline]
    fn get(&self, code_point: u32) -> u32 {
        dispatch!(self, trie => trie.get(code_point))
    }

    #[inline]
    fn get_from_u16_single_lead(&self, code_unit: u16) -> u32 {
        dispatch!(self, trie => trie.get_from_u16_single_lead(code_unit))
    }

    fn initial_value(&self) -> u32 {
        dispatch!(self, trie => trie.initial_value())
    }

    fn error_value(&self) -> u32 {
        dispatch!(self, trie => trie.error_value())
    }

    fn range_end(&self, start: u32, limit: u32, value: u32) -> u32 {
        dispatch!(self, trie => trie.range_end(start, limit, value))
    }
}

impl Statistics for AnyTrie {
    fn heap_bytes(&self) -> usize {
        dispatch!(self, trie => trie.heap_bytes())
    }

    fn num_elems(&self) -> usize {
        dispatch!(self, trie => trie.num_elems())
    }
}

impl<M> PartialEq<M> for AnyTrie
where
    M: CodePointMap,
{
    fn eq(&self, other: &M) -> bool {
        crate::utils::same_contents(self, other)
    }
}

impl Eq for AnyTrie {}

impl core::hash::Hash for AnyTrie {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        crate::utils::hash_contents(self, state);
    }
}
