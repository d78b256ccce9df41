use std::hash::{Hash, Hasher};

use crate::errors::{Result, TrieError};
use crate::CodePointMap;

pub trait FromU32 {
    fn from_u32(src: u32) -> Self;
}

impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // target_pointer_width is checked in lib.rs
        src as usize
    }
}

/// pack_uint appends the low `nbytes` bytes of `n` in the given byte order.
///
/// `nbytes` must be 1, 2 or 4.
#[inline]
pub fn pack_uint(buf: &mut Vec<u8>, n: u32, nbytes: usize, big_endian: bool) {
    debug_assert!(matches!(nbytes, 1 | 2 | 4));

    if big_endian {
        buf.extend_from_slice(&n.to_be_bytes()[4 - nbytes..]);
    } else {
        buf.extend_from_slice(&n.to_le_bytes()[..nbytes]);
    }
}

/// unpack_uint is the dual of pack_uint.
///
/// The caller guarantees `slice.len() >= nbytes`.
#[inline]
pub fn unpack_uint(slice: &[u8], nbytes: usize, big_endian: bool) -> u32 {
    debug_assert!(matches!(nbytes, 1 | 2 | 4));

    let mut n = 0;
    for i in 0..nbytes {
        let b = if big_endian {
            slice[i]
        } else {
            slice[nbytes - 1 - i]
        };
        n = (n << 8) | u32::from(b);
    }
    n
}

/// Cursor over a serialized byte stream.
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    big_endian: bool,
}

impl<'a> ByteReader<'a> {
    pub const fn new(bytes: &'a [u8], big_endian: bool) -> Self {
        Self { bytes, big_endian }
    }

    #[inline]
    pub fn read_uint(&mut self, nbytes: usize) -> Result<u32> {
        if self.bytes.len() < nbytes {
            return Err(TrieError::malformed("unexpected end of data"));
        }
        let n = unpack_uint(self.bytes, nbytes, self.big_endian);
        self.bytes = &self.bytes[nbytes..];
        Ok(n)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_uint(2)? as u16)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_uint(4)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        if self.bytes.len() < n {
            return Err(TrieError::malformed("unexpected end of data"));
        }
        self.bytes = &self.bytes[n..];
        Ok(())
    }

    pub const fn remaining(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Compares two maps by their observable contents: the initial and error
/// values, and every main-lane and lead-surrogate range.
pub fn same_contents<A, B>(a: &A, b: &B) -> bool
where
    A: CodePointMap,
    B: CodePointMap,
{
    if a.initial_value() != b.initial_value() || a.error_value() != b.error_value() {
        return false;
    }
    a.iter().eq(b.iter())
}

/// Hashes the observable contents; consistent with [`same_contents`].
pub fn hash_contents<M, H>(map: &M, state: &mut H)
where
    M: CodePointMap,
    H: Hasher,
{
    map.initial_value().hash(state);
    map.error_value().hash(state);
    for r in map.iter() {
        r.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let mut buf = vec![];
        pack_uint(&mut buf, 0x1234_5678, 4, false);
        pack_uint(&mut buf, 0x1234_5678, 4, true);
        pack_uint(&mut buf, 0xabcd, 2, true);
        pack_uint(&mut buf, 0xef, 1, false);
        assert_eq!(
            buf,
            vec![0x78, 0x56, 0x34, 0x12, 0x12, 0x34, 0x56, 0x78, 0xab, 0xcd, 0xef]
        );
        assert_eq!(unpack_uint(&buf[0..], 4, false), 0x1234_5678);
        assert_eq!(unpack_uint(&buf[4..], 4, true), 0x1234_5678);
        assert_eq!(unpack_uint(&buf[8..], 2, true), 0xabcd);
        assert_eq!(unpack_uint(&buf[10..], 1, true), 0xef);
    }

    #[test]
    fn test_byte_reader_eof() {
        let bytes = [1, 0, 0];
        let mut rdr = ByteReader::new(&bytes, false);
        assert_eq!(rdr.read_u16().unwrap(), 1);
        assert!(rdr.read_u16().is_err());
        assert_eq!(rdr.remaining(), &[0]);
    }
}
