//! # Sieve Core
//!
//! Adaptive filter-result cache for segmented search indexes.
//!
//! Evaluating a filter against an immutable index segment yields the set of
//! matching document ids. Sieve caches that set per (owner, segment, filter),
//! picking the cheaper of two encodings:
//!
//! - **Dense**: a bitset with one bit per document in the segment
//! - **Sparse**: a gap-encoded sorted list, when fewer than a quarter of the
//!   documents match and the list is actually smaller
//! - **Empty**: a zero-byte sentinel for filters matching nothing
//!
//! Entries live until their segment retires; the cache hears about
//! retirement through a weakly held listener and purges the segment.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sieve_core::{AdaptiveFilterCache, FilterResultCache, CacheConfig};
//!
//! let results = FilterResultCache::new(CacheConfig::default());
//! let front = AdaptiveFilterCache::new(results.clone());
//!
//! // Wrap any filter; evaluation now goes through the cache.
//! let cached = front.cache(filter);
//! let docs: Vec<u32> = cached.evaluate(&segment)?.collect();
//!
//! // Diagnostics
//! for entry in results.snapshot() {
//!     println!("{} {} {}", entry.segment, entry.filter, entry.kind);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::significant_drop_in_scrutinee)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod accountant;
pub mod cache;
pub mod config;
pub mod docset;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod segment;
pub mod selector;
pub mod wrapper;

#[cfg(test)]
mod test_support;

pub use accountant::{CacheStats, SizeAccountant};
pub use cache::{CacheEntryInfo, CacheKey, FilterResultCache, OwnerId, PurgeOutcome};
pub use config::{CacheConfig, ConfigError, LoggingConfig, ServerConfig, SieveConfig};
pub use docset::{DocId, DocSet, DocSetIter, DocSetKind, FixedBitSet, SharedDocSetIter, SortedVIntList};
pub use error::{Error, Result};
pub use filter::{effective_key, DocIdIter, Filter, FilterKey};
pub use lifecycle::SegmentTracker;
pub use segment::{RetirementHooks, RetirementListener, Segment, SegmentId};
pub use selector::{select_representation, select_representation_with};
pub use wrapper::{AdaptiveFilterCache, CachedFilter};
