//! Process-wide store of per-segment filter results.
//!
//! # Concurrency
//!
//! The entry map, the seen-segment set and the accountant are each safe for
//! concurrent use; no lock is ever held across filter evaluation.
//!
//! Two threads missing on the same key both compute, both charge the
//! accountant, and the last `insert` wins. The loser's bytes stay charged.
//! There is no compute-once guard: duplicate work is accepted in exchange
//! for a lock-free hit path.
//!
//! # Invalidation
//!
//! Entries live until their segment retires. The first miss on a segment
//! registers a weak [`RetirementListener`] with it; retirement purges every
//! entry for that segment across all owners.

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::accountant::{CacheStats, SizeAccountant};
use crate::config::CacheConfig;
use crate::docset::{DocSet, DocSetKind, FixedBitSet};
use crate::error::Result;
use crate::filter::{Filter, FilterKey};
use crate::lifecycle::SegmentTracker;
use crate::segment::{RetirementListener, Segment, SegmentId};
use crate::selector::select_representation_with;

/// Identity of the [`AdaptiveFilterCache`](crate::AdaptiveFilterCache) front
/// that created an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OwnerId(u64);

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

impl OwnerId {
    /// Allocates a fresh process-unique owner id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner-{}", self.0)
    }
}

/// Key of one cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Cache front that asked for the result.
    pub owner: OwnerId,
    /// Segment the result belongs to.
    pub segment: SegmentId,
    /// Explicit cache key of the filter, or its own key.
    pub filter: FilterKey,
}

impl CacheKey {
    /// Builds a key from its three components.
    #[must_use]
    pub fn new(owner: OwnerId, segment: SegmentId, filter: FilterKey) -> Self {
        Self {
            owner,
            segment,
            filter,
        }
    }
}

/// Result of purging a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    /// Entries removed.
    pub entries: usize,
    /// Bytes credited back to the accountant.
    pub bytes: usize,
}

/// Diagnostics view of one live entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryInfo {
    /// Owning cache front.
    pub owner: OwnerId,
    /// Segment identity.
    pub segment: SegmentId,
    /// Filter identity used as key.
    pub filter: FilterKey,
    /// Representation.
    pub kind: DocSetKind,
    /// True for the empty sentinel.
    pub is_empty: bool,
    /// Matching documents.
    pub cardinality: usize,
    /// Bytes used by the representation.
    pub size_in_bytes: usize,
    /// Popcount of the bitset, dense entries only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_cardinality: Option<usize>,
}

struct CacheShared {
    entries: DashMap<CacheKey, Arc<DocSet>, FxBuildHasher>,
    tracker: SegmentTracker,
    accountant: SizeAccountant,
    config: CacheConfig,
}

impl CacheShared {
    fn purge(&self, segment: SegmentId) -> PurgeOutcome {
        self.remove_where(|key| key.segment == segment)
    }

    fn remove_where(&self, mut matches: impl FnMut(&CacheKey) -> bool) -> PurgeOutcome {
        let mut outcome = PurgeOutcome::default();
        self.entries.retain(|key, set| {
            if !matches(key) {
                return true;
            }
            outcome.entries += 1;
            outcome.bytes += set.size_in_bytes();
            false
        });
        self.accountant.sub(outcome.bytes);
        self.accountant.record_evictions(outcome.entries as u64);
        outcome
    }
}

impl RetirementListener for CacheShared {
    fn on_segment_retiring(&self, segment: SegmentId) {
        self.tracker.forget(segment);
        let outcome = self.purge(segment);
        tracing::info!(
            segment = %segment,
            entries = outcome.entries,
            bytes = outcome.bytes,
            "segment retired, purged cached filter results"
        );
    }
}

/// Concurrent (owner, segment, filter) → [`DocSet`] store.
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct FilterResultCache {
    shared: Arc<CacheShared>,
}

impl Default for FilterResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl fmt::Debug for FilterResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterResultCache")
            .field("entries", &self.len())
            .field("size_in_bytes", &self.size_in_bytes())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl FilterResultCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            shared: Arc::new(CacheShared {
                entries: DashMap::with_hasher(FxBuildHasher),
                tracker: SegmentTracker::new(),
                accountant: SizeAccountant::new(),
                config,
            }),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Returns the cached result for `key`, computing and storing it on a miss.
    ///
    /// On a miss this blocks while `filter` scans `segment`.
    ///
    /// # Errors
    ///
    /// Errors from `filter.evaluate` are returned unchanged, and
    /// [`Error::DocOutOfRange`](crate::Error::DocOutOfRange) if the filter
    /// yields an id outside the segment. Nothing is stored on error.
    pub fn get_or_compute(
        &self,
        key: CacheKey,
        segment: &dyn Segment,
        filter: &dyn Filter,
    ) -> Result<Arc<DocSet>> {
        let shared = &self.shared;

        if !shared.config.enabled {
            shared.accountant.record_miss();
            return self.compute(segment, filter).map(Arc::new);
        }

        if let Some(hit) = self.get(&key) {
            shared.accountant.record_hit();
            tracing::trace!(segment = %key.segment, filter = %key.filter, "filter cache hit");
            return Ok(hit);
        }
        shared.accountant.record_miss();

        shared.tracker.on_first_reference(segment, self.listener());

        let set = Arc::new(self.compute(segment, filter)?);
        let bytes = set.size_in_bytes();
        shared.accountant.add(bytes);
        shared.entries.insert(key.clone(), Arc::clone(&set));
        tracing::debug!(
            segment = %key.segment,
            filter = %key.filter,
            kind = %set.kind(),
            cardinality = set.cardinality(),
            bytes,
            "cached filter result"
        );

        // Retirement may have purged this segment while we were computing.
        if !shared.tracker.is_tracked(key.segment)
            && shared
                .entries
                .remove_if(&key, |_, stored| Arc::ptr_eq(stored, &set))
                .is_some()
        {
            shared.accountant.sub(bytes);
            shared.accountant.record_evictions(1);
            tracing::warn!(
                segment = %key.segment,
                filter = %key.filter,
                "segment retired during computation, dropped late entry"
            );
        }

        Ok(set)
    }

    fn compute(&self, segment: &dyn Segment, filter: &dyn Filter) -> Result<DocSet> {
        let bits = FixedBitSet::from_doc_ids(filter.evaluate(segment)?, segment.max_doc())?;
        Ok(select_representation_with(
            bits,
            self.shared.config.compact_sparse,
        ))
    }

    /// Looks up `key` without computing.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<DocSet>> {
        self.shared
            .entries
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Removes every entry for `segment` across all owners.
    ///
    /// The segment stays tracked: its retirement listener is still
    /// registered, so later misses must not register another one.
    pub fn purge_segment(&self, segment: SegmentId) -> PurgeOutcome {
        self.shared.purge(segment)
    }

    /// Removes every entry and credits its bytes back.
    pub fn clear(&self) -> PurgeOutcome {
        let outcome = self.shared.remove_where(|_| true);
        tracing::info!(
            entries = outcome.entries,
            bytes = outcome.bytes,
            "filter cache cleared"
        );
        outcome
    }

    /// Weak handle registered with segments for retirement notifications.
    #[must_use]
    pub fn listener(&self) -> Weak<dyn RetirementListener> {
        let weak: Weak<CacheShared> = Arc::downgrade(&self.shared);
        weak
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    /// True if no entry is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.entries.is_empty()
    }

    /// Bytes charged by the accountant.
    #[must_use]
    pub fn size_in_bytes(&self) -> u64 {
        self.shared.accountant.size_in_bytes()
    }

    /// True if `segment` has a registered retirement listener.
    #[must_use]
    pub fn is_tracking(&self, segment: SegmentId) -> bool {
        self.shared.tracker.is_tracked(segment)
    }

    /// Point-in-time counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let accountant = &self.shared.accountant;
        CacheStats {
            entries: self.len(),
            size_in_bytes: accountant.size_in_bytes(),
            tracked_segments: self.shared.tracker.len(),
            hits: accountant.hits(),
            misses: accountant.misses(),
            evictions: accountant.evictions(),
        }
    }

    /// Describes every live entry, ordered by segment, owner and filter.
    ///
    /// Read-only and best-effort: entries inserted or purged while the
    /// snapshot runs may or may not appear.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CacheEntryInfo> {
        let mut entries: Vec<CacheEntryInfo> = self
            .shared
            .entries
            .iter()
            .map(|entry| {
                let (key, set) = entry.pair();
                CacheEntryInfo {
                    owner: key.owner,
                    segment: key.segment,
                    filter: key.filter.clone(),
                    kind: set.kind(),
                    is_empty: matches!(**set, DocSet::Empty),
                    cardinality: set.cardinality(),
                    size_in_bytes: set.size_in_bytes(),
                    bit_cardinality: set.bit_cardinality(),
                }
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.segment, a.owner, &a.filter).cmp(&(b.segment, b.owner, &b.filter))
        });
        entries
    }
}
