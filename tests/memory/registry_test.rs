/*!
 * Default Allocator Tests
 */

use offheap::{allocate, default_allocator};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::collections::HashSet;
use std::sync::Barrier;
use std::thread;

#[test]
#[serial]
fn test_default_allocator_is_shared() {
    let first = default_allocator().unwrap();
    let second = default_allocator().unwrap();

    assert!(first.same_as(second));
    assert_eq!(first.id(), second.id());
}

#[test]
#[serial]
fn test_free_function_uses_default_allocator() {
    let handle = allocate(100).unwrap();
    let default = default_allocator().unwrap();

    assert!(handle.allocator().same_as(default));
    assert!(default.is_live(handle.address()));
    assert_eq!(default.block_size(handle.address()), Some(100));

    let address = handle.address();
    handle.free();
    assert!(!default.is_live(address));
}

#[test]
#[serial]
fn test_concurrent_first_use_builds_one_allocator() {
    let start = Barrier::new(16);
    let ids: HashSet<_> = thread::scope(|scope| {
        let callers: Vec<_> = (0..16)
            .map(|_| {
                scope.spawn(|| {
                    start.wait();
                    default_allocator().unwrap().id()
                })
            })
            .collect();
        callers.into_iter().map(|c| c.join().unwrap()).collect()
    });

    assert_eq!(ids.len(), 1);
}
