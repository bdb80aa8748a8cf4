//! Fixed-size dense bitset, one bit per document in a segment.

use crate::error::{Error, Result};

/// Document id within a segment.
pub type DocId = u32;

const WORD_BITS: u32 = 64;

/// Dense bitset sized to a segment's `max_doc`.
///
/// Membership is a single word lookup. Memory is `ceil(num_bits / 64) * 8`
/// bytes regardless of how many bits are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBitSet {
    words: Vec<u64>,
    num_bits: u32,
}

impl FixedBitSet {
    /// Creates an all-clear bitset able to hold `num_bits` documents.
    #[must_use]
    pub fn new(num_bits: u32) -> Self {
        Self {
            words: vec![0; words_for(num_bits)],
            num_bits,
        }
    }

    /// Materializes raw filter output into a bitset sized to `max_doc`.
    ///
    /// Ids may arrive in any order and may repeat.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocOutOfRange`] for an id `>= max_doc`; nothing is
    /// built in that case.
    pub fn from_doc_ids<I>(doc_ids: I, max_doc: u32) -> Result<Self>
    where
        I: IntoIterator<Item = DocId>,
    {
        let mut bits = Self::new(max_doc);
        for doc in doc_ids {
            if doc >= max_doc {
                return Err(Error::DocOutOfRange { doc, max_doc });
            }
            bits.set(doc);
        }
        Ok(bits)
    }

    /// Sets the bit for `doc`.
    ///
    /// # Panics
    ///
    /// Panics if `doc >= self.len()`.
    pub fn set(&mut self, doc: DocId) {
        assert!(doc < self.num_bits, "doc {doc} out of bounds");
        self.words[(doc / WORD_BITS) as usize] |= 1u64 << (doc % WORD_BITS);
    }

    /// Returns true if `doc` is set. Out-of-range ids are never set.
    #[must_use]
    #[inline]
    pub fn contains(&self, doc: DocId) -> bool {
        if doc >= self.num_bits {
            return false;
        }
        self.words[(doc / WORD_BITS) as usize] & (1u64 << (doc % WORD_BITS)) != 0
    }

    /// Number of bits (the segment's document count).
    #[must_use]
    pub fn len(&self) -> u32 {
        self.num_bits
    }

    /// True if the bitset holds zero bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    /// Number of set bits.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Heap bytes used by the bit words.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u64>()
    }

    /// Returns the first set bit at or after `from`.
    #[must_use]
    pub fn next_set_bit(&self, from: DocId) -> Option<DocId> {
        if from >= self.num_bits {
            return None;
        }
        let mut word_idx = (from / WORD_BITS) as usize;
        let mut word = self.words[word_idx] & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                let doc = word_idx as u32 * WORD_BITS + word.trailing_zeros();
                return (doc < self.num_bits).then_some(doc);
            }
            word_idx += 1;
            if word_idx >= self.words.len() {
                return None;
            }
            word = self.words[word_idx];
        }
    }

    /// Iterates set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        let mut next = self.next_set_bit(0);
        std::iter::from_fn(move || {
            let doc = next?;
            next = doc.checked_add(1).and_then(|from| self.next_set_bit(from));
            Some(doc)
        })
    }
}

fn words_for(num_bits: u32) -> usize {
    num_bits.div_ceil(WORD_BITS) as usize
}
