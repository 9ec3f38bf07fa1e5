/*!
 * Concurrency Tests
 * Parallel allocation and racing release paths
 */

use super::support::{counting_allocator, tracking_configs};
use offheap::Handle;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Barrier;
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 200;

#[test]
fn test_parallel_allocations_are_distinct() {
    for config in tracking_configs() {
        let (allocator, heap) = counting_allocator(config);

        let handles: Vec<Handle> = thread::scope(|scope| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    let allocator = &allocator;
                    scope.spawn(move || {
                        (0..PER_THREAD)
                            .map(|_| allocator.allocate(48).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| worker.join().unwrap())
                .collect()
        });

        let addresses: HashSet<_> = handles.iter().map(Handle::address).collect();
        assert_eq!(addresses.len(), THREADS * PER_THREAD);
        assert_eq!(allocator.tracked(), THREADS * PER_THREAD);

        let tracked: HashSet<_> = allocator.tracked_addresses().into_iter().collect();
        assert_eq!(tracked, addresses);

        drop(handles);
        allocator.reclaim_pass();
        assert_eq!(allocator.tracked(), 0);
        assert_eq!(heap.frees(), THREADS * PER_THREAD);
        assert_eq!(heap.double_frees(), 0);
    }
}

#[test]
fn test_explicit_release_races_drop() {
    for config in tracking_configs() {
        let (allocator, heap) = counting_allocator(config);
        let handles: Vec<Handle> = (0..THREADS * PER_THREAD)
            .map(|_| allocator.allocate(16).unwrap())
            .collect();
        let addresses: Vec<_> = handles.iter().map(Handle::address).collect();
        let start = Barrier::new(2);

        thread::scope(|scope| {
            scope.spawn(|| {
                start.wait();
                drop(handles);
            });
            scope.spawn(|| {
                start.wait();
                for address in &addresses {
                    allocator.release(*address);
                }
            });
        });
        allocator.reclaim_pass();

        let stats = allocator.stats();
        assert_eq!(allocator.tracked(), 0);
        assert_eq!(heap.frees(), THREADS * PER_THREAD);
        assert_eq!(heap.double_frees(), 0);
        assert_eq!(
            stats.explicit_releases + stats.reclaimed,
            (THREADS * PER_THREAD) as u64
        );
    }
}

#[test]
fn test_release_all_races_allocation() {
    for config in tracking_configs() {
        let (allocator, heap) = counting_allocator(config);

        let kept: Vec<Handle> = thread::scope(|scope| {
            let producer = scope.spawn(|| {
                (0..PER_THREAD)
                    .map(|_| allocator.allocate(24).unwrap())
                    .collect::<Vec<_>>()
            });
            for _ in 0..10 {
                allocator.release_all();
            }
            producer.join().unwrap()
        });
        allocator.release_all();
        drop(kept);
        allocator.reclaim_pass();

        assert_eq!(allocator.tracked(), 0);
        assert_eq!(heap.frees(), PER_THREAD);
        assert_eq!(heap.outstanding(), 0);
        assert_eq!(heap.double_frees(), 0);
        assert_eq!(allocator.stats().live_bytes, 0);
    }
}
