//! Iterator of value ranges in a code point map.
use core::iter::FusedIterator;

use crate::{CodePointMap, CODE_POINT_LIMIT};

/// A maximal run of ordinals sharing one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    /// First ordinal of the run.
    pub start: u32,
    /// Last ordinal of the run (inclusive).
    pub end: u32,
    /// Value of every ordinal in the run, after mapping.
    pub value: u32,
    /// `true` if the run covers lead surrogate code units rather than code points.
    pub lead_surrogate: bool,
}

impl Range {
    /// Number of ordinals covered by the run.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Always `false`; a range covers at least one ordinal.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Checks if `c` lies within the run.
    #[inline]
    pub const fn contains(&self, c: u32) -> bool {
        self.start <= c && c <= self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lane {
    CodePoints,
    LeadSurrogates,
    Done,
}

/// Iterator created by [`CodePointMap::iter`] and its variants.
pub struct RangeIter<'t, M, F = fn(u32) -> u32> {
    map: &'t M,
    mapper: F,
    next_start: u32,
    limit: u32,
    lane: Lane,
    do_lead_surrogates: bool,
}

impl<'t, M, F> RangeIter<'t, M, F>
where
    M: CodePointMap,
    F: Fn(u32) -> u32,
{
    pub(crate) const fn new(map: &'t M, mapper: F) -> Self {
        Self {
            map,
            mapper,
            next_start: 0,
            limit: CODE_POINT_LIMIT,
            lane: Lane::CodePoints,
            do_lead_surrogates: true,
        }
    }

    pub(crate) fn for_lead_surrogate(map: &'t M, lead: u16, mapper: F) -> Self {
        debug_assert!((0xd800..=0xdbff).contains(&lead));
        let start = 0x10000 + ((u32::from(lead) - 0xd800) << 10);
        Self {
            map,
            mapper,
            next_start: start,
            limit: start + 0x400,
            lane: Lane::CodePoints,
            do_lead_surrogates: false,
        }
    }

    /// Checks if another range will be produced.
    pub fn has_next(&self) -> bool {
        match self.lane {
            Lane::CodePoints => self.do_lead_surrogates || self.next_start < self.limit,
            Lane::LeadSurrogates => self.next_start < 0xdc00,
            Lane::Done => false,
        }
    }

    fn next_code_point_range(&mut self) -> Range {
        let start = self.next_start;
        let mut value = self.map.get(start);
        let mapped = (self.mapper)(value);
        let mut end = self.map.range_end(start, self.limit, value);
        // Continue across raw-value boundaries as long as the mapped values agree.
        while end < self.limit - 1 {
            value = self.map.get(end + 1);
            if (self.mapper)(value) != mapped {
                break;
            }
            end = self.map.range_end(end + 1, self.limit, value);
        }
        self.next_start = end + 1;
        Range {
            start,
            end,
            value: mapped,
            lead_surrogate: false,
        }
    }

    fn next_lead_surrogate_range(&mut self) -> Range {
        let start = self.next_start;
        let get = |c: u32| self.map.get_from_u16_single_lead(c as u16);
        let mapped = (self.mapper)(get(start));
        let mut end = start;
        while end < 0xdbff && (self.mapper)(get(end + 1)) == mapped {
            end += 1;
        }
        self.next_start = end + 1;
        Range {
            start,
            end,
            value: mapped,
            lead_surrogate: true,
        }
    }
}

impl<M, F> Iterator for RangeIter<'_, M, F>
where
    M: CodePointMap,
    F: Fn(u32) -> u32,
{
    type Item = Range;

    fn next(&mut self) -> Option<Self::Item> {
        if self.lane == Lane::CodePoints && self.next_start >= self.limit {
            if self.do_lead_surrogates {
                self.lane = Lane::LeadSurrogates;
                self.next_start = 0xd800;
            } else {
                self.lane = Lane::Done;
            }
        }
        match self.lane {
            Lane::CodePoints => Some(self.next_code_point_range()),
            Lane::LeadSurrogates if self.next_start < 0xdc00 => {
                Some(self.next_lead_surrogate_range())
            }
            _ => {
                self.lane = Lane::Done;
                None
            }
        }
    }
}

impl<M, F> FusedIterator for RangeIter<'_, M, F>
where
    M: CodePointMap,
    F: Fn(u32) -> u32,
{
}

#[cfg(test)]
mod tests {
    use crate::{Builder, CodePointMap, MAX_CODE_POINT};

    fn sample_builder() -> Builder {
        let mut builder = Builder::new(0, 0xbad);
        builder.set_range(0x21, 0x7e, 0x5555, true).unwrap();
        builder.set_range(0x72, 0xdc, 3, true).unwrap();
        builder.set(0x1f600, 9).unwrap();
        builder.set_for_lead_surrogate_code_unit(0xd83d, 4);
        builder
    }

    #[test]
    fn test_ranges_cover_code_points() {
        let trie = sample_builder().freeze32().unwrap();
        let ranges: Vec<_> = trie.iter().filter(|r| !r.lead_surrogate).collect();

        assert_eq!(ranges.first().unwrap().start, 0);
        assert_eq!(ranges.last().unwrap().end, MAX_CODE_POINT);
        let total: u32 = ranges.iter().map(|r| r.len()).sum();
        assert_eq!(total, MAX_CODE_POINT + 1);
        for w in ranges.windows(2) {
            assert_eq!(w[0].end + 1, w[1].start);
            assert_ne!(w[0].value, w[1].value);
        }
        for r in &ranges {
            assert_eq!(trie.get(r.start), r.value);
            assert_eq!(trie.get(r.end), r.value);
        }
    }

    #[test]
    fn test_ranges_exact() {
        let builder = sample_builder();
        let ranges: Vec<_> = builder
            .iter()
            .map(|r| (r.start, r.end, r.value, r.lead_surrogate))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (0, 0x20, 0, false),
                (0x21, 0x71, 0x5555, false),
                (0x72, 0xdc, 3, false),
                (0xdd, 0x1f5ff, 0, false),
                (0x1f600, 0x1f600, 9, false),
                (0x1f601, 0x10ffff, 0, false),
                (0xd800, 0xd83c, 0, true),
                (0xd83d, 0xd83d, 4, true),
                (0xd83e, 0xdbff, 0, true),
            ]
        );
    }

    #[test]
    fn test_mapped_ranges_merge() {
        let trie = sample_builder().freeze16().unwrap();
        let ranges: Vec<_> = trie
            .iter_mapped(|v| u32::from(v != 0))
            .filter(|r| !r.lead_surrogate)
            .map(|r| (r.start, r.end, r.value))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (0, 0x20, 0),
                (0x21, 0xdc, 1),
                (0xdd, 0x1f5ff, 0),
                (0x1f600, 0x1f600, 1),
                (0x1f601, 0x10ffff, 0),
            ]
        );
    }

    #[test]
    fn test_lead_surrogate_iter() {
        let trie = sample_builder().freeze16().unwrap();
        // U+1F600 is encoded as D83D DE00.
        let ranges: Vec<_> = trie
            .iter_for_lead_surrogate(0xd83d)
            .unwrap()
            .map(|r| (r.start, r.end, r.value, r.lead_surrogate))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (0x1f400, 0x1f5ff, 0, false),
                (0x1f600, 0x1f600, 9, false),
                (0x1f601, 0x1f7ff, 0, false),
            ]
        );
        assert!(trie.iter_for_lead_surrogate(0xdc00).is_err());
        assert!(trie.iter_for_lead_surrogate(0x41).is_err());
    }

    #[test]
    fn test_restartable() {
        let trie = sample_builder().freeze32().unwrap();
        let mut it = trie.iter();
        assert!(it.has_next());
        let first = it.next().unwrap();
        let count = 1 + it.by_ref().count();
        assert!(!it.has_next());
        assert_eq!(it.next(), None);
        assert_eq!(trie.iter().next(), Some(first));
        assert_eq!(trie.iter().count(), count);
    }
}
