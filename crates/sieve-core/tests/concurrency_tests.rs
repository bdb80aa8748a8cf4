//! Concurrent access to a shared filter cache.
//!
//! Threads are released together through a `Barrier` so first accesses
//! genuinely race.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::{MemorySegment, ResidueFilter};
use sieve_core::{
    AdaptiveFilterCache, CacheEntryInfo, DocSetKind, Filter, FilterResultCache, Segment,
};

const THREADS: usize = 8;

#[test]
fn test_racing_first_accesses_register_one_listener() {
    let results = FilterResultCache::default();
    let front = AdaptiveFilterCache::new(results.clone());
    let segment = Arc::new(MemorySegment::new(4_096));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let filter = front.cache(Arc::new(ResidueFilter::new(THREADS as u32, i as u32)));
            let segment = Arc::clone(&segment);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                filter
                    .evaluate(segment.as_ref())
                    .expect("evaluate")
                    .count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("Thread panicked"), 4_096 / THREADS);
    }

    assert_eq!(segment.pending_listeners(), 1);
    let stats = results.stats();
    assert_eq!(stats.tracked_segments, 1);
    assert_eq!(stats.entries, THREADS);
}

#[test]
fn test_racing_misses_on_same_key_keep_one_entry() {
    // Arrange
    let results = FilterResultCache::default();
    let front = AdaptiveFilterCache::new(results.clone());
    let segment = Arc::new(MemorySegment::new(1_000_000));
    let raw = Arc::new(ResidueFilter::slow(1_000, 0, Duration::from_millis(50)));
    let filter = front.wrap(raw.clone());
    let filter = Arc::new(filter);
    let barrier = Arc::new(Barrier::new(2));

    // Act
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let filter = Arc::clone(&filter);
            let segment = Arc::clone(&segment);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                filter
                    .doc_set(segment.as_ref())
                    .expect("doc_set")
                    .expect("non-empty")
            })
        })
        .collect();
    let sets: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    // Assert
    let expected = raw.expected(1_000_000);
    for set in &sets {
        assert_eq!(set.kind(), DocSetKind::Sparse);
        assert_eq!(set.cardinality(), 1_000);
        assert_eq!(set.iter().collect::<Vec<_>>(), expected);
    }
    assert_eq!(results.len(), 1);

    // Both racers may have computed and charged; only one value survives.
    let one = sets[0].size_in_bytes() as u64;
    let charged = results.size_in_bytes();
    assert!(charged >= one && charged <= 2 * one, "charged {charged}");
    assert!((1..=2).contains(&raw.evaluations()));
}

#[test]
fn test_mixed_readers_always_see_correct_results() {
    let results = FilterResultCache::default();
    let front = AdaptiveFilterCache::new(results.clone());
    let segments: Arc<Vec<MemorySegment>> = Arc::new(
        [1_000, 10_000, 100_000]
            .into_iter()
            .map(MemorySegment::new)
            .collect(),
    );
    let filters: Arc<Vec<(Arc<ResidueFilter>, Arc<dyn Filter>)>> = Arc::new(
        [(2, 0), (3, 1), (97, 5), (5_000, 7)]
            .into_iter()
            .map(|(m, r)| {
                let raw = Arc::new(ResidueFilter::new(m, r));
                let cached = front.cache(raw.clone());
                (raw, cached)
            })
            .collect(),
    );
    let barrier = Arc::new(Barrier::new(THREADS * 2));

    let handles: Vec<_> = (0..THREADS * 2)
        .map(|t| {
            let segments = Arc::clone(&segments);
            let filters = Arc::clone(&filters);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for round in 0..20 {
                    let segment = &segments[(t + round) % segments.len()];
                    let (raw, cached) = &filters[(t * 7 + round) % filters.len()];
                    let docs: Vec<u32> = cached.evaluate(segment).expect("evaluate").collect();
                    assert_eq!(docs, raw.expected(segment.max_doc()));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert!(results.len() <= segments.len() * filters.len());
    assert_eq!(results.stats().tracked_segments, segments.len());
    for (raw, _) in filters.iter() {
        // At most one evaluation per segment, plus racing duplicates.
        assert!(raw.evaluations() >= 1);
    }
}

#[test]
fn test_retirement_during_computation_leaves_nothing_behind() {
    let results = FilterResultCache::default();
    let front = AdaptiveFilterCache::new(results.clone());
    let segment = Arc::new(MemorySegment::new(10_000));
    let filter = front.cache(Arc::new(ResidueFilter::slow(
        2,
        0,
        Duration::from_millis(200),
    )));

    let worker = {
        let segment = Arc::clone(&segment);
        thread::spawn(move || filter.evaluate(segment.as_ref()).expect("evaluate").count())
    };

    // The listener is registered before evaluation starts.
    while segment.pending_listeners() == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(segment.retire());

    assert_eq!(worker.join().expect("Thread panicked"), 5_000);
    assert!(results.is_empty());
    assert_eq!(results.size_in_bytes(), 0);
    assert_eq!(results.stats().evictions, 1);
    assert!(!results.is_tracking(segment.id()));
}

fn assert_consistent(entry: &CacheEntryInfo) {
    match entry.kind {
        DocSetKind::Empty => {
            assert!(entry.is_empty);
            assert_eq!(entry.cardinality, 0);
            assert_eq!(entry.bit_cardinality, None);
        }
        DocSetKind::Dense => {
            assert!(!entry.is_empty);
            assert_eq!(entry.bit_cardinality, Some(entry.cardinality));
        }
        DocSetKind::Sparse => {
            assert!(!entry.is_empty);
            assert!(entry.cardinality > 0);
            assert_eq!(entry.bit_cardinality, None);
        }
    }
}

#[test]
fn test_snapshot_during_inserts_and_retirements() {
    // Arrange
    const WRITERS: usize = 4;
    const READERS: usize = 3;
    let results = FilterResultCache::default();
    let front = AdaptiveFilterCache::new(results.clone());
    let segments: Arc<Vec<MemorySegment>> =
        Arc::new((0..16).map(|_| MemorySegment::new(1_000)).collect());
    let filters: Arc<Vec<Arc<dyn Filter>>> = Arc::new(
        [(2, 0), (97, 5), (5_000, 4_999)]
            .into_iter()
            .map(|(m, r)| front.cache(Arc::new(ResidueFilter::new(m, r))))
            .collect(),
    );
    let barrier = Arc::new(Barrier::new(WRITERS + READERS + 1));
    let stop = Arc::new(AtomicBool::new(false));

    // Act
    let writers: Vec<_> = (0..WRITERS)
        .map(|t| {
            let segments = Arc::clone(&segments);
            let filters = Arc::clone(&filters);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for round in 0..200 {
                    let segment = &segments[(t + round) % segments.len()];
                    let filter = &filters[(t + round) % filters.len()];
                    filter.evaluate(segment).expect("evaluate").count();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let results = results.clone();
            let barrier = Arc::clone(&barrier);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                barrier.wait();
                let mut snapshots = 0;
                loop {
                    for entry in results.snapshot() {
                        assert_consistent(&entry);
                    }
                    snapshots += 1;
                    if stop.load(Ordering::Relaxed) {
                        break snapshots;
                    }
                }
            })
        })
        .collect();

    let retirer = {
        let segments = Arc::clone(&segments);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for segment in segments.iter().step_by(2) {
                segment.retire();
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    for handle in writers {
        handle.join().expect("Thread panicked");
    }
    retirer.join().expect("Thread panicked");
    stop.store(true, Ordering::Relaxed);
    for handle in readers {
        assert!(handle.join().expect("Thread panicked") > 0);
    }

    // Assert
    for entry in results.snapshot() {
        assert_consistent(&entry);
        let segment = segments
            .iter()
            .position(|s| s.id() == entry.segment)
            .expect("known segment");
        assert_eq!(segment % 2, 1, "retired segment still cached");
    }
    for segment in segments.iter() {
        segment.retire();
    }
    assert!(results.is_empty());
    assert_eq!(results.stats().tracked_segments, 0);
}
