//! Sorted doc id list stored as variable-length encoded gaps.
//!
//! Each gap between consecutive ids is written 7 bits per byte, low bits
//! first, with the high bit set on every byte except the last. The first id
//! is stored as its gap from zero.

use super::bitset::{DocId, FixedBitSet};
use crate::error::{Error, Result};

const VALUE_BITS: u32 = 7;
const VALUE_MASK: u8 = 0x7F;
const CONTINUATION: u8 = 0x80;

/// Compressed, strictly ascending list of document ids.
///
/// Only supports forward iteration; there is no random membership test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedVIntList {
    bytes: Vec<u8>,
    len: usize,
}

impl SortedVIntList {
    /// Encodes the set bits of a dense bitset.
    #[must_use]
    pub fn from_bitset(bits: &FixedBitSet) -> Self {
        let mut builder = Builder::default();
        for doc in bits.iter() {
            builder.push_unchecked(doc);
        }
        builder.finish()
    }

    /// Encodes ids that are already strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if an id is not greater than its
    /// predecessor.
    pub fn try_from_sorted<I>(doc_ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = DocId>,
    {
        let mut builder = Builder::default();
        for doc in doc_ids {
            if builder.len > 0 && doc <= builder.last {
                return Err(Error::Internal(format!(
                    "doc ids must be strictly ascending: {doc} after {}",
                    builder.last
                )));
            }
            builder.push_unchecked(doc);
        }
        Ok(builder.finish())
    }

    /// Number of ids in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the list holds no ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Encoded size in bytes.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Decodes the id starting at byte offset `pos`, given the previous id.
    ///
    /// Returns the id and the offset of the next one, or `None` at the end.
    #[inline]
    pub(crate) fn decode_at(&self, pos: usize, last: DocId) -> Option<(DocId, usize)> {
        let mut pos = pos;
        let mut gap: u32 = 0;
        let mut shift = 0;
        loop {
            let byte = *self.bytes.get(pos)?;
            pos += 1;
            gap |= u32::from(byte & VALUE_MASK) << shift;
            if byte & CONTINUATION == 0 {
                return Some((last + gap, pos));
            }
            shift += VALUE_BITS;
        }
    }

    /// Iterates ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        let mut pos = 0;
        let mut last = 0;
        std::iter::from_fn(move || {
            let (doc, next) = self.decode_at(pos, last)?;
            pos = next;
            last = doc;
            Some(doc)
        })
    }
}

#[derive(Default)]
struct Builder {
    bytes: Vec<u8>,
    len: usize,
    last: DocId,
}

impl Builder {
    fn push_unchecked(&mut self, doc: DocId) {
        let mut gap = doc - self.last;
        while gap > u32::from(VALUE_MASK) {
            self.bytes.push((gap as u8 & VALUE_MASK) | CONTINUATION);
            gap >>= VALUE_BITS;
        }
        self.bytes.push(gap as u8);
        self.last = doc;
        self.len += 1;
    }

    fn finish(mut self) -> SortedVIntList {
        self.bytes.shrink_to_fit();
        SortedVIntList {
            bytes: self.bytes,
            len: self.len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_gaps_take_one_byte_each() {
        let list = SortedVIntList::try_from_sorted([0, 1, 2, 100, 227]).unwrap();

        assert_eq!(list.len(), 5);
        assert_eq!(list.size_in_bytes(), 5);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![0, 1, 2, 100, 227]);
    }

    #[test]
    fn test_large_gap_spans_multiple_bytes() {
        // gap 128 needs two bytes, gap 2^21 needs four
        let list = SortedVIntList::try_from_sorted([128, 128 + (1 << 21)]).unwrap();

        assert_eq!(list.size_in_bytes(), 2 + 4);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![128, 128 + (1 << 21)]);
    }

    #[test]
    fn test_max_doc_id_roundtrip() {
        let list = SortedVIntList::try_from_sorted([0, u32::MAX]).unwrap();

        assert_eq!(list.size_in_bytes(), 1 + 5);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![0, u32::MAX]);
    }

    #[test]
    fn test_rejects_unsorted_input() {
        assert!(SortedVIntList::try_from_sorted([5, 3]).is_err());
        assert!(SortedVIntList::try_from_sorted([5, 5]).is_err());
    }

    #[test]
    fn test_from_bitset_matches_bits() {
        let bits = FixedBitSet::from_doc_ids([7, 300, 9_000], 10_000).unwrap();

        let list = SortedVIntList::from_bitset(&bits);

        assert_eq!(list.len(), 3);
        assert_eq!(
            list.iter().collect::<Vec<_>>(),
            bits.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_empty_list() {
        let list = SortedVIntList::try_from_sorted(std::iter::empty()).unwrap();

        assert!(list.is_empty());
        assert_eq!(list.size_in_bytes(), 0);
        assert_eq!(list.iter().next(), None);
    }
}
