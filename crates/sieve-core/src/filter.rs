//! Filter abstraction consumed from the query engine.
//!
//! A filter is a predicate over the documents of one segment. Evaluating it
//! produces the matching ids; the cache only ever sees that iterator plus the
//! filter's identity.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::docset::DocId;
use crate::error::Result;
use crate::segment::Segment;

/// Raw, uncached match iterator returned by [`Filter::evaluate`].
pub type DocIdIter<'a> = Box<dyn Iterator<Item = DocId> + Send + 'a>;

/// Identity of a filter for caching purposes.
///
/// Equal filters must produce equal keys. Cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterKey(Arc<str>);

impl FilterKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterKey({:?})", &*self.0)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for FilterKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl From<&str> for FilterKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for FilterKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// A predicate over the documents of a segment.
pub trait Filter: Send + Sync + fmt::Debug {
    /// Computes the matching document ids for `segment`.
    ///
    /// May be arbitrarily expensive; runs on the calling thread.
    ///
    /// # Errors
    ///
    /// Any error is returned to the caller unchanged.
    fn evaluate<'a>(&'a self, segment: &'a dyn Segment) -> Result<DocIdIter<'a>>;

    /// The filter's own identity.
    fn key(&self) -> FilterKey;

    /// Explicit logical cache key, when distinct filter instances should
    /// share cache entries. Overrides [`Filter::key`] for caching.
    fn cache_key(&self) -> Option<FilterKey> {
        None
    }

    /// False for filters whose results must never be cached.
    fn is_cacheable(&self) -> bool {
        true
    }

    /// True only for filters that already consult the cache.
    fn is_cached(&self) -> bool {
        false
    }
}

/// Key actually used in the cache: the explicit cache key if present.
#[must_use]
pub fn effective_key(filter: &dyn Filter) -> FilterKey {
    filter.cache_key().unwrap_or_else(|| filter.key())
}
