//! Host-side segment abstraction.
//!
//! The cache never owns a segment. It keeps only the segment's [`SegmentId`]
//! and learns about retirement through a [`RetirementListener`] that the
//! segment holds weakly.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Weak;

/// Identity of one immutable segment instance.
///
/// Two segments are never equal, even when they hold identical data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SegmentId(u64);

static NEXT_SEGMENT_ID: AtomicU64 = AtomicU64::new(1);

impl SegmentId {
    /// Allocates a fresh process-unique id. Ids are never recycled.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg-{}", self.0)
    }
}

/// Receives the one-shot "segment is retiring" notification.
pub trait RetirementListener: Send + Sync {
    /// Called once when the segment is about to be discarded.
    fn on_segment_retiring(&self, segment: SegmentId);
}

/// An immutable, independently searchable slice of an index.
pub trait Segment: Send + Sync {
    /// Stable identity for the lifetime of this segment.
    fn id(&self) -> SegmentId;

    /// Number of documents; valid doc ids are `0..max_doc`.
    fn max_doc(&self) -> u32;

    /// Registers a listener to be notified exactly once on retirement.
    ///
    /// If the segment has already retired, the listener is notified
    /// immediately.
    fn add_retirement_listener(&self, listener: Weak<dyn RetirementListener>);
}

/// Fire-once listener list that host segment types can embed.
///
/// Listeners are held weakly: a retiring segment never keeps a cache alive.
#[derive(Default)]
pub struct RetirementHooks {
    fired: AtomicBool,
    listeners: Mutex<Vec<Weak<dyn RetirementListener>>>,
}

impl RetirementHooks {
    /// Creates an empty, unfired hook list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener, or notifies it right away if `fire` already ran.
    pub fn register(&self, segment: SegmentId, listener: Weak<dyn RetirementListener>) {
        {
            let mut listeners = self.listeners.lock();
            if !self.fired.load(Ordering::Acquire) {
                listeners.push(listener);
                return;
            }
        }
        if let Some(listener) = listener.upgrade() {
            listener.on_segment_retiring(segment);
        }
    }

    /// Notifies every live listener. Only the first call has any effect.
    ///
    /// Returns true if this call performed the notification.
    pub fn fire(&self, segment: SegmentId) -> bool {
        let listeners = {
            let mut listeners = self.listeners.lock();
            if self.fired.swap(true, Ordering::AcqRel) {
                return false;
            }
            std::mem::take(&mut *listeners)
        };
        for listener in listeners.iter().filter_map(Weak::upgrade) {
            listener.on_segment_retiring(segment);
        }
        true
    }

    /// True once `fire` has run.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Number of listeners waiting for notification.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl fmt::Debug for RetirementHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetirementHooks")
            .field("fired", &self.is_fired())
            .field("pending", &self.pending())
            .finish()
    }
}
