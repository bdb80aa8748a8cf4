//! Cached filter results.
//!
//! A [`DocSet`] is the immutable answer to "which documents of this segment
//! matched". It comes in one of three shapes:
//!
//! | Variant  | Membership | Iteration | Memory                      |
//! |----------|------------|-----------|-----------------------------|
//! | `Empty`  | O(1)       | O(1)      | 0                           |
//! | `Dense`  | O(1)       | O(n / 64) | `max_doc / 8` bytes         |
//! | `Sparse` | unsupported| O(c)      | ~1-2 bytes per matched doc  |
//!
//! Sparse sets are only ever consumed by iteration, so asking one for
//! membership is a programming error and reported as such.

mod bitset;
mod vint;

pub use bitset::{DocId, FixedBitSet};
pub use vint::SortedVIntList;

use serde::Serialize;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Representation tag, as reported to diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocSetKind {
    /// Matches nothing.
    Empty,
    /// One bit per document.
    Dense,
    /// Delta-encoded sorted ids.
    Sparse,
}

impl fmt::Display for DocSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::Dense => "dense",
            Self::Sparse => "sparse",
        })
    }
}

/// Immutable set of matching document ids for one (segment, filter) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocSet {
    /// Result that matches no document.
    Empty,
    /// Dense bitset sized to the segment.
    Dense(FixedBitSet),
    /// Sorted, gap-encoded id list.
    Sparse(SortedVIntList),
}

impl DocSet {
    /// Returns true if `doc` matched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for sparse sets, which only
    /// support iteration.
    pub fn contains(&self, doc: DocId) -> Result<bool> {
        match self {
            Self::Empty => Ok(false),
            Self::Dense(bits) => Ok(bits.contains(doc)),
            Self::Sparse(_) => Err(Error::UnsupportedOperation(
                "membership test on a sparse doc set",
            )),
        }
    }

    /// Number of matching documents.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Dense(bits) => bits.cardinality(),
            Self::Sparse(list) => list.len(),
        }
    }

    /// Estimated heap footprint of the set.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Dense(bits) => bits.size_in_bytes(),
            Self::Sparse(list) => list.size_in_bytes(),
        }
    }

    /// Representation tag.
    #[must_use]
    pub fn kind(&self) -> DocSetKind {
        match self {
            Self::Empty => DocSetKind::Empty,
            Self::Dense(_) => DocSetKind::Dense,
            Self::Sparse(_) => DocSetKind::Sparse,
        }
    }

    /// True if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Dense(bits) => bits.cardinality() == 0,
            Self::Sparse(list) => list.is_empty(),
        }
    }

    /// True if membership tests are supported.
    #[must_use]
    pub fn supports_contains(&self) -> bool {
        !matches!(self, Self::Sparse(_))
    }

    /// Popcount of the underlying bitset, for dense sets only.
    #[must_use]
    pub fn bit_cardinality(&self) -> Option<usize> {
        match self {
            Self::Dense(bits) => Some(bits.cardinality()),
            _ => None,
        }
    }

    /// Iterates matching ids in ascending order.
    #[must_use]
    pub fn iter(&self) -> DocSetIter<&DocSet> {
        DocSetIter::new(self)
    }
}

/// Ascending iterator over a [`DocSet`].
///
/// Generic over how the set is held so that a cached `Arc<DocSet>` can be
/// iterated without borrowing from the cache.
pub struct DocSetIter<S> {
    set: S,
    cursor: Cursor,
}

enum Cursor {
    Done,
    Dense { from: DocId },
    Sparse { pos: usize, last: DocId },
}

impl<S: Deref<Target = DocSet>> DocSetIter<S> {
    /// Starts iteration at the first matching id.
    pub fn new(set: S) -> Self {
        let cursor = match &*set {
            DocSet::Empty => Cursor::Done,
            DocSet::Dense(_) => Cursor::Dense { from: 0 },
            DocSet::Sparse(_) => Cursor::Sparse { pos: 0, last: 0 },
        };
        Self { set, cursor }
    }
}

impl<S: Deref<Target = DocSet>> Iterator for DocSetIter<S> {
    type Item = DocId;

    fn next(&mut self) -> Option<DocId> {
        let next = match (&*self.set, &self.cursor) {
            (DocSet::Dense(bits), Cursor::Dense { from }) => bits.next_set_bit(*from).map(|doc| {
                let cursor = match doc.checked_add(1) {
                    Some(from) => Cursor::Dense { from },
                    None => Cursor::Done,
                };
                (doc, cursor)
            }),
            (DocSet::Sparse(list), Cursor::Sparse { pos, last }) => list
                .decode_at(*pos, *last)
                .map(|(doc, pos)| (doc, Cursor::Sparse { pos, last: doc })),
            _ => None,
        };
        match next {
            Some((doc, cursor)) => {
                self.cursor = cursor;
                Some(doc)
            }
            None => {
                self.cursor = Cursor::Done;
                None
            }
        }
    }
}

/// Owning iterator over a shared, cached set.
pub type SharedDocSetIter = DocSetIter<Arc<DocSet>>;

impl<'a> IntoIterator for &'a DocSet {
    type Item = DocId;
    type IntoIter = DocSetIter<&'a DocSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
