//! Query-engine facing cache front.
//!
//! [`AdaptiveFilterCache`] decorates filters so that evaluating them on a
//! segment consults the shared [`FilterResultCache`] first.

use rustc_hash::FxHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::cache::{CacheKey, FilterResultCache, OwnerId};
use crate::docset::{DocSet, SharedDocSetIter};
use crate::error::Result;
use crate::filter::{effective_key, DocIdIter, Filter, FilterKey};
use crate::segment::Segment;

/// Mixed into the inner key hash so a wrapper never hashes like its filter.
const WRAPPER_HASH_SALT: u64 = 0x1117_BF25;

/// One cache front over a shared [`FilterResultCache`].
///
/// Each front has its own [`OwnerId`]; entries created through different
/// fronts never collide, but all of them are purged when their segment
/// retires.
#[derive(Debug, Clone)]
pub struct AdaptiveFilterCache {
    owner: OwnerId,
    cache: FilterResultCache,
}

impl AdaptiveFilterCache {
    /// Creates a front with a fresh owner id.
    #[must_use]
    pub fn new(cache: FilterResultCache) -> Self {
        Self {
            owner: OwnerId::next(),
            cache,
        }
    }

    /// Name reported to diagnostics.
    #[must_use]
    pub const fn cache_type() -> &'static str {
        "adaptive"
    }

    /// Owner id stamped on entries created through this front.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Shared result store.
    #[must_use]
    pub fn result_cache(&self) -> &FilterResultCache {
        &self.cache
    }

    /// Wraps `filter` so its results are cached.
    ///
    /// Non-cacheable filters and filters that are already cached come back
    /// unchanged, so wrapping is idempotent.
    #[must_use]
    pub fn cache(&self, filter: Arc<dyn Filter>) -> Arc<dyn Filter> {
        if !filter.is_cacheable() || filter.is_cached() {
            return filter;
        }
        Arc::new(self.wrap(filter))
    }

    /// Wraps `filter` unconditionally.
    #[must_use]
    pub fn wrap(&self, filter: Arc<dyn Filter>) -> CachedFilter {
        CachedFilter {
            inner: filter,
            owner: self.owner,
            cache: self.cache.clone(),
        }
    }

    /// True if `filter` already goes through a cache.
    #[must_use]
    pub fn is_cached(filter: &dyn Filter) -> bool {
        filter.is_cached()
    }

    /// Drops every cached entry, across all owners.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

/// A filter whose per-segment results are cached.
pub struct CachedFilter {
    inner: Arc<dyn Filter>,
    owner: OwnerId,
    cache: FilterResultCache,
}

impl CachedFilter {
    /// The wrapped filter.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn Filter> {
        &self.inner
    }

    /// Cache key used for `segment`.
    #[must_use]
    pub fn key_for(&self, segment: &dyn Segment) -> CacheKey {
        CacheKey::new(self.owner, segment.id(), effective_key(self.inner.as_ref()))
    }

    /// Cached result for `segment`, computing it on first use.
    ///
    /// Returns `None` when nothing matched.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors of the inner filter. Nothing is cached
    /// in that case.
    pub fn doc_set(&self, segment: &dyn Segment) -> Result<Option<Arc<DocSet>>> {
        let set = self
            .cache
            .get_or_compute(self.key_for(segment), segment, self.inner.as_ref())?;
        if matches!(*set, DocSet::Empty) {
            return Ok(None);
        }
        Ok(Some(set))
    }
}

impl Filter for CachedFilter {
    fn evaluate<'a>(&'a self, segment: &'a dyn Segment) -> Result<DocIdIter<'a>> {
        Ok(match self.doc_set(segment)? {
            Some(set) => Box::new(SharedDocSetIter::new(set)),
            None => Box::new(std::iter::empty()),
        })
    }

    fn key(&self) -> FilterKey {
        self.inner.key()
    }

    fn cache_key(&self) -> Option<FilterKey> {
        self.inner.cache_key()
    }

    fn is_cached(&self) -> bool {
        true
    }
}

impl PartialEq for CachedFilter {
    fn eq(&self, other: &Self) -> bool {
        self.inner.key() == other.inner.key()
    }
}

impl Eq for CachedFilter {}

impl Hash for CachedFilter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut inner = FxHasher::default();
        self.inner.key().hash(&mut inner);
        state.write_u64(inner.finish() ^ WRAPPER_HASH_SALT);
    }
}

impl fmt::Debug for CachedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache({:?})", self.inner)
    }
}
