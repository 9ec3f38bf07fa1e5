/*!
 * Test Support
 * Instrumented native heap shared by the memory tests
 */

use offheap::{Allocator, AllocatorConfig, NativeHeap, SystemHeap};
use parking_lot::Mutex;
use std::alloc::Layout;
use std::collections::HashSet;
use std::io;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// System heap that counts calls and detects double frees
#[derive(Default)]
pub struct CountingHeap {
    live: Mutex<HashSet<usize>>,
    allocations: AtomicUsize,
    frees: AtomicUsize,
    double_frees: AtomicUsize,
    panic_next_free: AtomicBool,
}

impl CountingHeap {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    pub fn double_frees(&self) -> usize {
        self.double_frees.load(Ordering::SeqCst)
    }

    pub fn outstanding(&self) -> usize {
        self.live.lock().len()
    }

    /// Make the next `free` panic before touching the block
    pub fn panic_on_next_free(&self) {
        self.panic_next_free.store(true, Ordering::SeqCst);
    }
}

unsafe impl NativeHeap for CountingHeap {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        let ptr = SystemHeap.allocate(layout)?;
        self.live.lock().insert(ptr.as_ptr() as usize);
        self.allocations.fetch_add(1, Ordering::SeqCst);
        Some(ptr)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        if self.panic_next_free.swap(false, Ordering::SeqCst) {
            panic!("injected native free failure");
        }
        if !self.live.lock().remove(&(ptr.as_ptr() as usize)) {
            self.double_frees.fetch_add(1, Ordering::SeqCst);
            return;
        }
        self.frees.fetch_add(1, Ordering::SeqCst);
        SystemHeap.free(ptr, layout);
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Allocator over a fresh counting heap
pub fn counting_allocator(config: AllocatorConfig) -> (Allocator, Arc<CountingHeap>) {
    let heap = CountingHeap::new();
    let allocator = Allocator::builder()
        .with_config(config)
        .with_heap(Arc::clone(&heap))
        .build()
        .expect("Failed to build allocator");
    (allocator, heap)
}

/// Both tracking strategies
pub fn tracking_configs() -> Vec<AllocatorConfig> {
    vec![AllocatorConfig::new(), AllocatorConfig::new().sharded()]
}

/// Shared buffer for a `fmt` subscriber's output
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn count(&self, needle: &str) -> usize {
        String::from_utf8_lossy(&self.0.lock()).matches(needle).count()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
