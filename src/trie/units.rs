//! Lookup of the values along UTF-16 text.
use crate::errors::{Result, TrieError};
use crate::CodePointMap;

/// One code point of the text with its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnitValue {
    /// Position of the first code unit of the code point.
    pub index: usize,
    /// The code point; unpaired surrogates are reported as themselves.
    pub code_point: u32,
    /// Value of the code point.
    pub value: u32,
}

/// Bidirectional cursor created by [`CodePointMap::units_iter`].
///
/// # Examples
///
/// ```
/// use utrie::{Builder, CodePointMap};
///
/// let mut builder = Builder::new(0, 0xbad);
/// builder.set(0x61, 1).unwrap();
/// builder.set(0x1f600, 2).unwrap();
///
/// let text: Vec<u16> = "a😀b".encode_utf16().collect();
/// let values: Vec<_> = builder.units_iter(&text, 0).map(|u| (u.index, u.value)).collect();
/// assert_eq!(values, vec![(0, 1), (1, 2), (3, 0)]);
///
/// let mut it = builder.units_iter(&text, text.len());
/// assert_eq!(it.previous().map(|u| u.code_point), Some(0x62));
/// assert_eq!(it.previous().map(|u| u.code_point), Some(0x1f600));
/// assert_eq!(it.index(), 1);
/// ```
pub struct UnitsIter<'t, M> {
    map: &'t M,
    text: &'t [u16],
    index: usize,
}

impl<'t, M> UnitsIter<'t, M>
where
    M: CodePointMap,
{
    pub(crate) fn new(map: &'t M, text: &'t [u16], index: usize) -> Self {
        Self {
            map,
            text,
            index: index.min(text.len()),
        }
    }

    /// Current position in code units.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Checks if [`Iterator::next`] will produce a value.
    pub fn has_next(&self) -> bool {
        self.index < self.text.len()
    }

    /// Checks if [`UnitsIter::previous`] will produce a value.
    pub const fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Moves the cursor to `index`.
    ///
    /// # Errors
    ///
    /// [`TrieError`] will be returned when `index` is beyond the end of the text.
    pub fn set(&mut self, index: usize) -> Result<()> {
        if index > self.text.len() {
            let (index, len) = (index as u32, self.text.len() as u32);
            return Err(TrieError::range(index, index, len));
        }
        self.index = index;
        Ok(())
    }

    /// Steps back over the code point before the cursor.
    pub fn previous(&mut self) -> Option<UnitValue> {
        if self.index == 0 {
            return None;
        }
        let mut start = self.index - 1;
        let mut code_point = u32::from(self.text[start]);
        if is_trail(code_point) && start > 0 {
            let lead = u32::from(self.text[start - 1]);
            if is_lead(lead) {
                start -= 1;
                code_point = supplementary(lead, code_point);
            }
        }
        self.index = start;
        Some(UnitValue {
            index: start,
            code_point,
            value: self.map.get(code_point),
        })
    }
}

impl<M> Iterator for UnitsIter<'_, M>
where
    M: CodePointMap,
{
    type Item = UnitValue;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.index;
        let mut code_point = u32::from(*self.text.get(start)?);
        self.index += 1;
        if is_lead(code_point) {
            if let Some(&trail) = self.text.get(self.index) {
                if is_trail(u32::from(trail)) {
                    self.index += 1;
                    code_point = supplementary(code_point, u32::from(trail));
                }
            }
        }
        Some(UnitValue {
            index: start,
            code_point,
            value: self.map.get(code_point),
        })
    }
}

#[inline(always)]
const fn is_lead(u: u32) -> bool {
    u & 0xfc00 == 0xd800
}

#[inline(always)]
const fn is_trail(u: u32) -> bool {
    u & 0xfc00 == 0xdc00
}

#[inline(always)]
const fn supplementary(lead: u32, trail: u32) -> u32 {
    0x10000 + ((lead - 0xd800) << 10) + (trail - 0xdc00)
}

#[cfg(test)]
mod tests {
    use crate::{Builder, CodePointMap};

    fn sample_trie() -> crate::FrozenTrie<u16> {
        let mut builder = Builder::new(0, 0xbad);
        builder.set(0x41, 1).unwrap();
        builder.set(0xd800, 2).unwrap();
        builder.set(0xdc00, 3).unwrap();
        builder.set(0x10000, 4).unwrap();
        builder.set_for_lead_surrogate_code_unit(0xd800, 5);
        builder.freeze16().unwrap()
    }

    #[test]
    fn test_forward_and_backward() {
        let trie = sample_trie();
        // A, U+10000, unpaired trail, unpaired lead at the end.
        let text: [u16; 5] = [0x41, 0xd800, 0xdc00, 0xdc00, 0xd800];

        let forward: Vec<_> = trie
            .units_iter(&text, 0)
            .map(|u| (u.index, u.code_point, u.value))
            .collect();
        assert_eq!(
            forward,
            vec![(0, 0x41, 1), (1, 0x10000, 4), (3, 0xdc00, 3), (4, 0xd800, 2)]
        );

        let mut it = trie.units_iter(&text, text.len());
        let mut backward = vec![];
        while it.has_previous() {
            let u = it.previous().unwrap();
            backward.push((u.index, u.code_point, u.value));
        }
        backward.reverse();
        assert_eq!(backward, forward);
        assert!(it.previous().is_none());
    }

    #[test]
    fn test_set_and_bounds() {
        let trie = sample_trie();
        let text: [u16; 3] = [0x41, 0xd800, 0xdc00];
        let mut it = trie.units_iter(&text, 0);
        assert!(!it.has_previous());

        // Starting in the middle of a pair reads the trail alone.
        it.set(2).unwrap();
        assert_eq!(it.next().map(|u| u.code_point), Some(0xdc00));
        assert!(!it.has_next());
        assert!(it.next().is_none());

        assert!(it.set(4).is_err());
        assert_eq!(it.index(), 3);
        it.set(3).unwrap();
        assert_eq!(it.previous().map(|u| u.index), Some(1));

        let empty: [u16; 0] = [];
        assert!(trie.units_iter(&empty, 5).next().is_none());
    }
}
