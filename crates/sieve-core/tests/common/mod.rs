//! Shared fixtures for sieve-core integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Weak;
use std::thread;
use std::time::Duration;

use sieve_core::{
    DocId, DocIdIter, Filter, FilterKey, Result, RetirementHooks, RetirementListener, Segment,
    SegmentId,
};

/// Segment of `max_doc` documents that can be retired on demand.
pub struct MemorySegment {
    id: SegmentId,
    max_doc: u32,
    hooks: RetirementHooks,
}

impl MemorySegment {
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

impl Segment for MemorySegment {
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

/// Matches documents with `doc % modulus == residue`.
///
/// Counts evaluations and can be slowed down to widen race windows.
#[derive(Debug)]
pub struct ResidueFilter {
    modulus: u32,
    residue: u32,
    delay: Option<Duration>,
    evaluations: AtomicUsize,
}

impl ResidueFilter {
    pub fn new(modulus: u32, residue: u32) -> Self {
        Self {
            modulus,
            residue,
            delay: None,
            evaluations: AtomicUsize::new(0),
        }
    }

    pub fn slow(modulus: u32, residue: u32, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(modulus, residue)
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }

    /// Uncached reference answer.
    pub fn expected(&self, max_doc: u32) -> Vec<DocId> {
        (0..max_doc)
            .filter(|doc| doc % self.modulus == self.residue)
            .collect()
    }
}

impl Filter for ResidueFilter {
    fn evaluate<'a>(&'a self, segment: &'a dyn Segment) -> Result<DocIdIter<'a>> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        Ok(Box::new(
            (0..segment.max_doc()).filter(move |doc| doc % self.modulus == self.residue),
        ))
    }

    fn key(&self) -> FilterKey {
        FilterKey::new(format!("mod:{}={}", self.modulus, self.residue))
    }
}

/// Filter that must never be cached, such as one depending on wall time.
#[derive(Debug)]
pub struct VolatileFilter;

impl Filter for VolatileFilter {
    fn evaluate<'a>(&'a self, segment: &'a dyn Segment) -> Result<DocIdIter<'a>> {
        Ok(Box::new(0..segment.max_doc().min(3)))
    }

    fn key(&self) -> FilterKey {
        FilterKey::from("volatile")
    }

    fn is_cacheable(&self) -> bool {
        false
    }
}
