//! Representation selection for freshly computed filter results.
//!
//! Every result starts life as a dense bitset. Before it is cached, low
//! density results are re-encoded as a [`SortedVIntList`] when that is
//! strictly smaller:
//!
//! 1. cardinality 0 → [`DocSet::Empty`]
//! 2. `cardinality * 4 < max_doc` **and** sparse bytes < dense bytes → `Sparse`
//! 3. otherwise → `Dense`
//!
//! The density check is a cheap pre-filter; the byte comparison is the real
//! decision, since irregular gaps can cost more than one bit per document.

use crate::docset::{DocSet, FixedBitSet, SortedVIntList};

/// A result is a sparse candidate when fewer than `1 / SPARSE_DENSITY_DIVISOR`
/// of the segment's documents matched.
pub const SPARSE_DENSITY_DIVISOR: u64 = 4;

/// Returns true if `cardinality` is low enough, relative to `max_doc`, to try
/// the sparse encoding.
#[must_use]
#[inline]
pub fn is_sparse_candidate(cardinality: usize, max_doc: u32) -> bool {
    (cardinality as u64) * SPARSE_DENSITY_DIVISOR < u64::from(max_doc)
}

/// Picks the most compact representation for `bits`.
#[must_use]
pub fn select_representation(bits: FixedBitSet) -> DocSet {
    select_representation_with(bits, true)
}

/// Same as [`select_representation`]; with `compact_sparse == false` the
/// result is never re-encoded as sparse.
#[must_use]
pub fn select_representation_with(bits: FixedBitSet, compact_sparse: bool) -> DocSet {
    let cardinality = bits.cardinality();
    if cardinality == 0 {
        return DocSet::Empty;
    }
    if compact_sparse && is_sparse_candidate(cardinality, bits.len()) {
        let list = SortedVIntList::from_bitset(&bits);
        if list.size_in_bytes() < bits.size_in_bytes() {
            return DocSet::Sparse(list);
        }
    }
    DocSet::Dense(bits)
}
