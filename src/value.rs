//! Value types that can be stored in frozen tries and compact arrays.
use core::fmt::Debug;
use core::hash::Hash;

/// Declared width of the values in a serialized trie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueWidth {
    /// 16-bit values.
    Bits16,
    /// 32-bit values.
    Bits32,
    /// 8-bit values.
    Bits8,
}

impl ValueWidth {
    /// Number of bytes occupied by one value.
    pub const fn bytes(self) -> usize {
        match self {
            Self::Bits8 => 1,
            Self::Bits16 => 2,
            Self::Bits32 => 4,
        }
    }

    /// Number of bits occupied by one value.
    pub const fn bits(self) -> u8 {
        (self.bytes() * 8) as u8
    }

    // Tag stored in the low bits of the trie header options.
    pub(crate) const fn tag(self) -> u16 {
        match self {
            Self::Bits16 => 0,
            Self::Bits32 => 1,
            Self::Bits8 => 2,
        }
    }

    pub(crate) const fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(Self::Bits16),
            1 => Some(Self::Bits32),
            2 => Some(Self::Bits8),
            _ => None,
        }
    }

    pub(crate) const fn from_bytes(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Bits8),
            2 => Some(Self::Bits16),
            4 => Some(Self::Bits32),
            _ => None,
        }
    }
}

/// An unsigned integer that can be stored in a [`FrozenTrie`](crate::FrozenTrie)
/// or a [`CompactArray`](crate::CompactArray).
///
/// Builders always work with `u32`; a narrower type is chosen when freezing.
pub trait TrieValue: Copy + Eq + Hash + Debug + Default + Send + Sync + 'static {
    /// The declared width of this type.
    const WIDTH: ValueWidth;

    /// Escape value of the run-length text encoding.
    const ESCAPE: Self;

    /// Converts a `u32` into this type, or returns `None` if it does not fit.
    fn try_from_u32(v: u32) -> Option<Self>;

    /// Widens this value to a `u32`.
    fn to_u32(self) -> u32;
}

macro_rules! impl_trie_value {
    ($primitive:ty, $width:expr, $escape:expr) => {
        impl TrieValue for $primitive {
            const WIDTH: ValueWidth = $width;
            const ESCAPE: Self = $escape;

            #[inline(always)]
            fn try_from_u32(v: u32) -> Option<Self> {
                Self::try_from(v).ok()
            }

            #[inline(always)]
            fn to_u32(self) -> u32 {
                u32::from(self)
            }
        }
    };
}

impl_trie_value!(u8, ValueWidth::Bits8, 0xa5);
impl_trie_value!(u16, ValueWidth::Bits16, 0xa5a5);
impl_trie_value!(u32, ValueWidth::Bits32, 0xa5a5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_tags() {
        for w in [ValueWidth::Bits8, ValueWidth::Bits16, ValueWidth::Bits32] {
            assert_eq!(ValueWidth::from_tag(w.tag()), Some(w));
            assert_eq!(ValueWidth::from_bytes(w.bytes() as u8), Some(w));
        }
        assert_eq!(ValueWidth::from_tag(3), None);
        assert_eq!(ValueWidth::from_bytes(3), None);
    }

    #[test]
    fn test_try_from_u32() {
        assert_eq!(u16::try_from_u32(0xffff), Some(0xffff));
        assert_eq!(u16::try_from_u32(0x10000), None);
        assert_eq!(u8::try_from_u32(0x100), None);
        assert_eq!(u32::try_from_u32(u32::MAX), Some(u32::MAX));
        assert_eq!(0xbeefu16.to_u32(), 0xbeef);
    }
}
