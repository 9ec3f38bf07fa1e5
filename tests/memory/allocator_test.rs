/*!
 * Allocator Tests
 * allocate / release / release_all semantics and accounting
 */

use super::support::{counting_allocator, tracking_configs, Capture};
use miette::Diagnostic;
use offheap::{Allocator, AllocatorConfig, FailureReason, OffHeapError};
use pretty_assertions::assert_eq;
use tracing::Level;

#[test]
fn test_allocator_initialization() {
    let (allocator, heap) = counting_allocator(AllocatorConfig::new());

    assert_eq!(allocator.tracked(), 0);
    assert_eq!(allocator.tracked_bytes(), 0);
    assert_eq!(heap.allocations(), 0);

    let stats = allocator.stats();
    assert_eq!(stats.allocator_id, allocator.id());
    assert_eq!(stats.allocations, 0);
}

#[test]
fn test_put_get_then_release_twice() {
    for config in tracking_configs() {
        let (allocator, heap) = counting_allocator(config);

        let handle = allocator.allocate(1000).unwrap();
        let address = handle.address();
        unsafe {
            handle.put_int(0, 0);
            handle.put_int(4, 1);
            handle.put_int(8, 130);
            assert_eq!(handle.get_int(8), 130);
        }

        allocator.release(address);
        allocator.release(address);

        assert!(!allocator.is_live(address));
        assert_eq!(heap.frees(), 1);
        assert_eq!(heap.double_frees(), 0);

        // The handle's drop notice is stale by now
        drop(handle);
        allocator.reclaim_pass();
        assert_eq!(heap.frees(), 1);
        assert_eq!(heap.double_frees(), 0);
    }
}

#[test]
fn test_distinct_addresses() {
    let allocator = Allocator::new().unwrap();

    let a = allocator.allocate(1024).unwrap();
    let b = allocator.allocate(2048).unwrap();
    let c = allocator.allocate(4096).unwrap();

    assert_ne!(a.address(), b.address());
    assert_ne!(b.address(), c.address());
    assert_ne!(a.address(), c.address());
    assert_eq!(allocator.tracked_bytes(), 1024 + 2048 + 4096);
    assert_eq!(allocator.stats().live_bytes, 1024 + 2048 + 4096);
}

#[test]
fn test_release_all_empties_map_and_frees_once() {
    for config in tracking_configs() {
        let (allocator, heap) = counting_allocator(config);
        let handles: Vec<_> = (1..=5).map(|i| allocator.allocate(i * 100).unwrap()).collect();

        let report = allocator.release_all();

        assert_eq!(report.leaked_blocks(), 5);
        assert_eq!(report.leaked_bytes(), 100 + 200 + 300 + 400 + 500);
        assert_eq!(allocator.tracked(), 0);
        assert_eq!(heap.frees(), 5);
        assert_eq!(heap.outstanding(), 0);

        // Second sweep finds nothing
        assert!(allocator.release_all().is_empty());

        // Dropping the swept handles must not free again
        drop(handles);
        allocator.reclaim_pass();
        assert_eq!(heap.frees(), 5);
        assert_eq!(heap.double_frees(), 0);
        assert_eq!(allocator.stats().swept, 5);
    }
}

#[test]
fn test_release_unknown_address_is_noop() {
    let (allocator, heap) = counting_allocator(AllocatorConfig::new());
    let handle = allocator.allocate(64).unwrap();

    allocator.release(0xDEAD_0000);
    allocator.release(handle.address() + 1);

    assert!(handle.is_live());
    assert_eq!(heap.frees(), 0);
    assert_eq!(allocator.stats().explicit_releases, 0);
}

#[test]
fn test_untracked_release_logged_at_debug() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(Level::DEBUG)
        .finish();

    // trace_events stays off; the ignored release must still show at debug
    let allocator = Allocator::new().unwrap();
    tracing::subscriber::with_default(subscriber, || {
        allocator.release(0xBEEF_0000);
    });

    assert_eq!(capture.count("Release of untracked address ignored"), 1);
    assert_eq!(capture.count("0xbeef0000"), 1);
}

#[test]
fn test_release_from_other_allocator_is_noop() {
    let first = Allocator::new().unwrap();
    let second = Allocator::new().unwrap();
    let handle = first.allocate(64).unwrap();

    second.release(handle.address());

    assert!(first.is_live(handle.address()));
    assert!(!second.is_live(handle.address()));
    assert!(!first.same_as(&second));
}

#[test]
fn test_allocation_failure_is_reported() {
    let allocator = Allocator::new().unwrap();

    let err = allocator.allocate(0).unwrap_err();
    match &err {
        OffHeapError::AllocationFailure { size, align, reason } => {
            assert_eq!(*size, 0);
            assert_eq!(*align, 8);
            assert_eq!(*reason, FailureReason::ZeroSize);
        }
        other => panic!("Expected AllocationFailure, got {other:?}"),
    }
    assert_eq!(
        err.code().map(|c| c.to_string()),
        Some("offheap::allocation_failure".to_string())
    );

    // The allocator survives the failure
    let handle = allocator.allocate(8).unwrap();
    assert!(handle.is_live());
}

#[test]
fn test_invalid_config_rejected_by_builder() {
    let err = Allocator::builder()
        .with_config(AllocatorConfig::new().with_alignment(3))
        .build()
        .unwrap_err();
    assert!(matches!(err, OffHeapError::InvalidConfig(_)));
}

#[test]
fn test_teardown_frees_leaked_blocks() {
    let (allocator, heap) = counting_allocator(AllocatorConfig::new());
    let address = allocator.allocate(512).unwrap().leak();
    assert!(allocator.is_live(address));

    drop(allocator);

    assert_eq!(heap.frees(), 1);
    assert_eq!(heap.outstanding(), 0);
}

#[test]
fn test_stats_count_every_path() {
    let (allocator, _heap) = counting_allocator(AllocatorConfig::new());

    allocator.allocate(10).unwrap().free();
    drop(allocator.allocate(20).unwrap());
    allocator.reclaim_pass();
    let _kept = allocator.allocate(30).unwrap();
    allocator.release_all();

    let stats = allocator.stats();
    assert_eq!(stats.allocations, 3);
    assert_eq!(stats.explicit_releases, 1);
    assert_eq!(stats.reclaimed, 1);
    assert_eq!(stats.swept, 1);
    assert_eq!(stats.released(), 3);
    assert_eq!(stats.live_blocks, 0);
    assert_eq!(stats.live_bytes, 0);
}

#[test]
fn test_stats_serialize() {
    let allocator = Allocator::new().unwrap();
    let _handle = allocator.allocate(100).unwrap();

    let json = serde_json::to_value(allocator.stats()).unwrap();
    assert_eq!(json["live_blocks"], 1);
    assert_eq!(json["live_bytes"], 100);
}
