//! Segments and filters shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Weak;

use crate::docset::DocId;
use crate::error::{Error, Result};
use crate::filter::{DocIdIter, Filter, FilterKey};
use crate::segment::{RetirementHooks, RetirementListener, Segment, SegmentId};

/// In-memory segment that can be retired on demand.
pub struct TestSegment {
    id: SegmentId,
    max_doc: u32,
    hooks: RetirementHooks,
}

impl TestSegment {
    pub fn new(max_doc: u32) -> Self {
        Self {
            id: SegmentId::next(),
            max_doc,
            hooks: RetirementHooks::new(),
        }
    }

    pub fn retire(&self) -> bool {
        self.hooks.fire(self.id)
    }

    pub fn pending_listeners(&self) -> usize {
        self.hooks.pending()
    }
}

impl Segment for TestSegment {
    fn id(&self) -> SegmentId {
        self.id
    }

    fn max_doc(&self) -> u32 {
        self.max_doc
    }

    fn add_retirement_listener(&self, listener: Weak<dyn RetirementListener>) {
        self.hooks.register(self.id, listener);
    }
}

/// Filter matching a fixed list of ids, counting its evaluations.
#[derive(Debug)]
pub struct IdsFilter {
    key: String,
    ids: Vec<DocId>,
    cache_key: Option<String>,
    cacheable: bool,
    evaluations: AtomicUsize,
}

impl IdsFilter {
    pub fn new(key: &str, ids: impl IntoIterator<Item = DocId>) -> Self {
        Self {
            key: key.to_string(),
            ids: ids.into_iter().collect(),
            cache_key: None,
            cacheable: true,
            evaluations: AtomicUsize::new(0),
        }
    }

    pub fn with_cache_key(mut self, cache_key: &str) -> Self {
        self.cache_key = Some(cache_key.to_string());
        self
    }

    pub fn non_cacheable(mut self) -> Self {
        self.cacheable = false;
        self
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl Filter for IdsFilter {
    fn evaluate<'a>(&'a self, _segment: &'a dyn Segment) -> Result<DocIdIter<'a>> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.ids.iter().copied()))
    }

    fn key(&self) -> FilterKey {
        FilterKey::new(self.key.as_str())
    }

    fn cache_key(&self) -> Option<FilterKey> {
        self.cache_key.as_deref().map(FilterKey::from)
    }

    fn is_cacheable(&self) -> bool {
        self.cacheable
    }
}

/// Filter whose evaluation always fails.
#[derive(Debug, Default)]
pub struct FailingFilter {
    evaluations: AtomicUsize,
}

impl FailingFilter {
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl Filter for FailingFilter {
    fn evaluate<'a>(&'a self, _segment: &'a dyn Segment) -> Result<DocIdIter<'a>> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        Err(Error::Evaluation("field not indexed".to_string()))
    }

    fn key(&self) -> FilterKey {
        FilterKey::from("failing")
    }
}
