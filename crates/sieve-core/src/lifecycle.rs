//! Tracks which segments have a retirement listener registered.
//!
//! Exactly one listener is registered per segment no matter how many
//! entries or threads reference it: the thread whose atomic insert into
//! the seen-set succeeds is the only one that registers.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::Weak;

use crate::segment::{RetirementListener, Segment, SegmentId};

/// Set of segments the cache has seen.
#[derive(Debug, Default)]
pub struct SegmentTracker {
    seen: DashMap<SegmentId, (), FxBuildHasher>,
}

impl SegmentTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` with `segment` if this is the first reference.
    ///
    /// Returns true only for the caller that performed the registration.
    pub fn on_first_reference(
        &self,
        segment: &dyn Segment,
        listener: Weak<dyn RetirementListener>,
    ) -> bool {
        let id = segment.id();
        if self.seen.contains_key(&id) {
            return false;
        }
        match self.seen.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                // Release the shard lock before calling into the host, which
                // may notify synchronously if the segment already retired.
                drop(vacant.insert(()));
                segment.add_retirement_listener(listener);
                tracing::debug!(segment = %id, "registered retirement listener");
                true
            }
        }
    }

    /// Forgets `segment`. Returns true if it was tracked.
    pub fn forget(&self, segment: SegmentId) -> bool {
        self.seen.remove(&segment).is_some()
    }

    /// True if `segment` currently has a listener registered.
    #[must_use]
    pub fn is_tracked(&self, segment: SegmentId) -> bool {
        self.seen.contains_key(&segment)
    }

    /// Number of tracked segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True if no segment is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
