//! Binary data header shared by serialized data files.
//!
//! A serialized trie starts with a 32-byte data header:
//!
//! | Offset | Size | Field |
//! |-------:|-----:|-------|
//! | 0  | 2 | header size (32) |
//! | 2  | 2 | magic bytes `0xDA 0x27` |
//! | 4  | 2 | info size (20) |
//! | 6  | 2 | reserved |
//! | 8  | 1 | big-endian flag |
//! | 9  | 1 | charset family |
//! | 10 | 1 | bytes per value |
//! | 11 | 1 | reserved |
//! | 12 | 4 | data format identifier, `"Tri2"` for tries |
//! | 16 | 4 | data version |
//! | 20 | 4 | Unicode version |
//! | 24 | 8 | zero padding |
//!
//! The header size and info size are stored in the byte order of the data.
use tracing::trace;

use crate::errors::{Result, TrieError};
use crate::utils::{pack_uint, unpack_uint, ByteReader};
use crate::value::ValueWidth;

/// The two magic bytes following the header size.
pub const MAGIC: [u8; 2] = [0xda, 0x27];

/// Data format identifier of serialized tries.
pub const TRIE_FORMAT_ID: [u8; 4] = *b"Tri2";

/// Size of the data header in bytes.
pub const DATA_HEADER_SIZE: usize = 32;

const DATA_INFO_SIZE: usize = 20;

pub(crate) const TRIE_SIGNATURE: u32 = 0x5472_6932;
pub(crate) const TRIE_HEADER_SIZE: usize = 20;

const OPTIONS_WIDTH_MASK: u16 = 0xf;

/// Descriptive fields of the data header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DataInfo {
    /// Byte order of every multi-byte field that follows the magic bytes.
    pub big_endian: bool,
    /// Character set family; 0 for ASCII.
    pub charset_family: u8,
    /// Data format identifier.
    pub format_id: [u8; 4],
    /// Version of the data format, checked by the acceptance predicate.
    pub data_version: [u8; 4],
    /// Version of the Unicode data the file was built from.
    pub unicode_version: [u8; 4],
}

impl Default for DataInfo {
    fn default() -> Self {
        Self {
            big_endian: false,
            charset_family: 0,
            format_id: TRIE_FORMAT_ID,
            data_version: [2, 0, 0, 0],
            unicode_version: [0; 4],
        }
    }
}

/// Appends a data header for `info` with values of `width` to `buf`.
pub fn write_header(buf: &mut Vec<u8>, info: &DataInfo, width: ValueWidth) {
    let be = info.big_endian;
    pack_uint(buf, DATA_HEADER_SIZE as u32, 2, be);
    buf.extend_from_slice(&MAGIC);
    pack_uint(buf, DATA_INFO_SIZE as u32, 2, be);
    pack_uint(buf, 0, 2, be);
    buf.push(u8::from(info.big_endian));
    buf.push(info.charset_family);
    buf.push(width.bytes() as u8);
    buf.push(0);
    buf.extend_from_slice(&info.format_id);
    buf.extend_from_slice(&info.data_version);
    buf.extend_from_slice(&info.unicode_version);
    buf.resize(buf.len() + DATA_HEADER_SIZE - 4 - DATA_INFO_SIZE, 0);
}

/// Parses a data header and returns its fields, the declared value width and the
/// bytes following the header.
///
/// # Arguments
///
/// - `bytes`: Serialized data starting with a data header.
/// - `format_id`: Expected data format identifier.
/// - `accept`: Predicate over the data version; `None` accepts every version.
///
/// # Errors
///
/// [`TrieError`] will be returned when
///
/// - the header is truncated or inconsistent,
/// - the magic bytes or the format identifier do not match, or
/// - `accept` rejects the data version.
pub fn read_header<'a>(
    bytes: &'a [u8],
    format_id: [u8; 4],
    accept: Option<&dyn Fn(&[u8; 4]) -> bool>,
) -> Result<(DataInfo, ValueWidth, &'a [u8])> {
    if bytes.len() < 4 + DATA_INFO_SIZE {
        return Err(TrieError::malformed("data header is truncated"));
    }
    if bytes[2..4] != MAGIC {
        return Err(TrieError::malformed("bad magic bytes"));
    }
    let big_endian = match bytes[8] {
        0 => false,
        1 => true,
        _ => return Err(TrieError::malformed("bad byte order flag")),
    };
    let header_size = unpack_uint(&bytes[0..], 2, big_endian) as usize;
    let info_size = unpack_uint(&bytes[4..], 2, big_endian) as usize;
    if info_size < DATA_INFO_SIZE || header_size < 4 + info_size || header_size > bytes.len() {
        return Err(TrieError::malformed("inconsistent data header size"));
    }
    let width = ValueWidth::from_bytes(bytes[10])
        .ok_or_else(|| TrieError::malformed("bad value width in data header"))?;

    let quad = |i: usize| [bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]];
    let info = DataInfo {
        big_endian,
        charset_family: bytes[9],
        format_id: quad(12),
        data_version: quad(16),
        unicode_version: quad(20),
    };
    if info.format_id != format_id {
        return Err(TrieError::malformed("unexpected data format identifier"));
    }
    if let Some(accept) = accept {
        if !accept(&info.data_version) {
            return Err(TrieError::rejected(info.data_version));
        }
    }
    trace!(
        big_endian,
        bits = width.bits(),
        data_version = ?info.data_version,
        "read data header"
    );
    Ok((info, width, &bytes[header_size..]))
}

/// The fixed-size header of a serialized trie, following the data header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TrieHeader {
    pub width: ValueWidth,
    pub index_length: u16,
    pub shifted_data_length: u16,
    pub index2_null_offset: u16,
    pub data_null_offset: u16,
    pub shifted_high_start: u16,
    pub error_value: u32,
}

impl TrieHeader {
    pub fn write(&self, buf: &mut Vec<u8>, big_endian: bool) {
        pack_uint(buf, TRIE_SIGNATURE, 4, big_endian);
        pack_uint(buf, u32::from(self.width.tag()), 2, big_endian);
        for n in [
            self.index_length,
            self.shifted_data_length,
            self.index2_null_offset,
            self.data_null_offset,
            self.shifted_high_start,
        ] {
            pack_uint(buf, u32::from(n), 2, big_endian);
        }
        pack_uint(buf, self.error_value, 4, big_endian);
    }

    pub fn read(rdr: &mut ByteReader) -> Result<Self> {
        if rdr.read_u32()? != TRIE_SIGNATURE {
            return Err(TrieError::malformed("bad trie signature"));
        }
        let options = rdr.read_u16()?;
        let width = ValueWidth::from_tag(options & OPTIONS_WIDTH_MASK)
            .ok_or_else(|| TrieError::malformed("bad value width in trie header"))?;
        Ok(Self {
            width,
            index_length: rdr.read_u16()?,
            shifted_data_length: rdr.read_u16()?,
            index2_null_offset: rdr.read_u16()?,
            data_null_offset: rdr.read_u16()?,
            shifted_high_start: rdr.read_u16()?,
            error_value: rdr.read_u32()?,
        })
    }
}
