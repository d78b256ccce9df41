//! Run-length encoding of value arrays into UTF-16 text.
//!
//! The text starts with the array length in two code units, high half first.
//! The runs follow as symbols: code units for 16-bit values, pairs of code units
//! for 32-bit values, and bytes packed two per code unit (high byte first) for
//! 8-bit values. A run shorter than four is written literally, with every escape
//! symbol doubled. A longer run is written as the escape symbol, the run length
//! and the value.
use crate::errors::{Result, TrieError};
use crate::{TrieValue, ValueWidth};

const MIN_RUN: usize = 4;

/// Encodes `values` into run-length encoded UTF-16 text.
///
/// # Examples
///
/// ```
/// use utrie::compact_array::rle;
///
/// let values = [7u16, 7, 7, 7, 7, 1];
/// let units = rle::encode(&values);
/// assert_eq!(units, vec![0, 6, 0xa5a5, 5, 7, 1]);
/// assert_eq!(rle::decode::<u16>(&units).unwrap(), values);
/// ```
pub fn encode<T>(values: &[T]) -> Vec<u16>
where
    T: TrieValue,
{
    let mut sink = SymbolSink::new(T::WIDTH);
    let len = values.len() as u32;
    sink.units.push((len >> 16) as u16);
    sink.units.push(len as u16);

    let max_run = if T::WIDTH == ValueWidth::Bits8 { 0xff } else { 0xffff };
    let escape = T::ESCAPE.to_u32();
    let mut iter = values.iter().map(|v| v.to_u32());
    if let Some(first) = iter.next() {
        let (mut run_value, mut run_length) = (first, 1);
        for v in iter {
            if v == run_value && run_length < max_run {
                run_length += 1;
            } else {
                sink.push_run(run_value, run_length, escape);
                run_value = v;
                run_length = 1;
            }
        }
        sink.push_run(run_value, run_length, escape);
    }
    sink.finish()
}

/// Decodes text produced by [`encode`].
///
/// # Errors
///
/// [`TrieError`] will be returned when the text is truncated, or when a run
/// exceeds the declared length.
pub fn decode<T>(units: &[u16]) -> Result<Vec<T>>
where
    T: TrieValue,
{
    if units.len() < 2 {
        return Err(TrieError::malformed("run-length text is missing its length"));
    }
    let len = ((u32::from(units[0]) << 16) | u32::from(units[1])) as usize;
    let escape = T::ESCAPE.to_u32();
    let mut symbols = Symbols::new(&units[2..], T::WIDTH);
    let mut next = || symbols.next().ok_or_else(|| TrieError::malformed("run-length text is truncated"));

    let mut values = vec![];
    while values.len() < len {
        let s = next()?;
        if s != escape {
            values.push(to_value(s)?);
            continue;
        }
        let s = next()?;
        if s == escape {
            values.push(T::ESCAPE);
            continue;
        }
        let run_length = s as usize;
        let value = to_value(next()?)?;
        if values.len() + run_length > len {
            return Err(TrieError::malformed("run exceeds the declared length"));
        }
        values.resize(values.len() + run_length, value);
    }
    Ok(values)
}

fn to_value<T: TrieValue>(s: u32) -> Result<T> {
    T::try_from_u32(s).ok_or_else(|| TrieError::malformed("value overflow in run-length text"))
}

struct SymbolSink {
    width: ValueWidth,
    units: Vec<u16>,
    // High byte waiting for its low byte, for 8-bit symbols.
    pending: Option<u8>,
}

impl SymbolSink {
    const fn new(width: ValueWidth) -> Self {
        Self {
            width,
            units: vec![],
            pending: None,
        }
    }

    fn push(&mut self, s: u32) {
        match self.width {
            ValueWidth::Bits8 => match self.pending.take() {
                Some(high) => self.units.push(u16::from(high) << 8 | (s & 0xff) as u16),
                None => self.pending = Some(s as u8),
            },
            ValueWidth::Bits16 => self.units.push(s as u16),
            ValueWidth::Bits32 => {
                self.units.push((s >> 16) as u16);
                self.units.push(s as u16);
            }
        }
    }

    fn push_run(&mut self, value: u32, mut length: u32, escape: u32) {
        if (length as usize) < MIN_RUN {
            for _ in 0..length {
                if value == escape {
                    self.push(escape);
                }
                self.push(value);
            }
            return;
        }
        // A length equal to the escape would read as an escaped literal.
        if length == escape {
            if value == escape {
                self.push(escape);
            }
            self.push(value);
            length -= 1;
        }
        self.push(escape);
        self.push(length);
        self.push(value);
    }

    fn finish(mut self) -> Vec<u16> {
        if self.pending.is_some() {
            self.push(0);
        }
        self.units
    }
}

struct Symbols<'a> {
    units: &'a [u16],
    width: ValueWidth,
    // Low byte of the current unit, for 8-bit symbols.
    pending: Option<u8>,
}

impl<'a> Symbols<'a> {
    const fn new(units: &'a [u16], width: ValueWidth) -> Self {
        Self {
            units,
            width,
            pending: None,
        }
    }
}

impl Iterator for Symbols<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if let Some(low) = self.pending.take() {
            return Some(u32::from(low));
        }
        match self.width {
            ValueWidth::Bits8 => {
                let (&unit, rest) = self.units.split_first()?;
                self.units = rest;
                self.pending = Some(unit as u8);
                Some(u32::from(unit >> 8))
            }
            ValueWidth::Bits16 => {
                let (&unit, rest) = self.units.split_first()?;
                self.units = rest;
                Some(u32::from(unit))
            }
            ValueWidth::Bits32 => {
                if self.units.len() < 2 {
                    return None;
                }
                let s = (u32::from(self.units[0]) << 16) | u32::from(self.units[1]);
                self.units = &self.units[2..];
                Some(s)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_runs() {
        let mut values = vec![0u16; 300];
        values.extend_from_slice(&[0xa5a5, 1, 1, 0xa5a5, 0xa5a5, 0xa5a5, 0xa5a5, 0xa5a5]);
        let units = encode(&values);
        assert_eq!(
            units,
            vec![0, 308, 0xa5a5, 300, 0, 0xa5a5, 0xa5a5, 1, 1, 0xa5a5, 5, 0xa5a5]
        );
        assert_eq!(decode::<u16>(&units).unwrap(), values);
    }

    #[test]
    fn test_run_length_equal_to_escape() {
        let values = vec![3u16; 0xa5a5];
        let units = encode(&values);
        assert_eq!(units, vec![0, 0xa5a5, 3, 0xa5a5, 0xa5a4, 3]);
        assert_eq!(decode::<u16>(&units).unwrap(), values);

        // Runs longer than 0xffff are split.
        let values = vec![9u16; 0x10001];
        let units = encode(&values);
        assert_eq!(units, vec![1, 1, 0xa5a5, 0xffff, 9, 9, 9]);
        assert_eq!(decode::<u16>(&units).unwrap(), values);
    }

    #[test]
    fn test_u8_packing() {
        let values = [1u8, 2, 2, 2, 2, 2, 0xa5];
        let units = encode(&values);
        // 01 | A5 05 02 | A5 A5, packed two bytes per unit.
        assert_eq!(units, vec![0, 7, 0x01a5, 0x0502, 0xa5a5]);
        assert_eq!(decode::<u8>(&units).unwrap(), values);

        let values = [0xa5u8; 0xa5];
        let units = encode(&values);
        assert_eq!(decode::<u8>(&units).unwrap(), values);

        let values = vec![4u8; 1000];
        assert_eq!(decode::<u8>(&encode(&values)).unwrap(), values);
    }

    #[test]
    fn test_u32_pairs() {
        let values = [0x1234_5678u32, 0xa5a5, 7, 7, 7, 7];
        let units = encode(&values);
        assert_eq!(
            units,
            vec![0, 6, 0x1234, 0x5678, 0, 0xa5a5, 0, 0xa5a5, 0, 0xa5a5, 0, 4, 0, 7]
        );
        assert_eq!(decode::<u32>(&units).unwrap(), values);
    }

    #[test]
    fn test_empty() {
        let units = encode::<u16>(&[]);
        assert_eq!(units, vec![0, 0]);
        assert!(decode::<u16>(&units).unwrap().is_empty());
    }

    #[test]
    fn test_malformed() {
        assert!(decode::<u16>(&[0]).is_err());
        assert!(decode::<u16>(&[0, 3, 1, 2]).is_err());
        assert!(decode::<u16>(&[0, 3, 0xa5a5, 4, 1]).is_err());
        assert!(decode::<u32>(&[0, 1, 0]).is_err());
    }
}
