/*!
 * Native Heaps
 * `NativeHeap` implementations over real allocators
 */

use super::traits::NativeHeap;
use std::alloc::Layout;
use std::ptr::NonNull;

/// The Rust global allocator
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHeap;

unsafe impl NativeHeap for SystemHeap {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: layout has a non-zero size
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    #[inline]
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

/// jemalloc, independent of the process's global allocator
#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[derive(Debug, Default, Clone, Copy)]
pub struct JemallocHeap;

#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
unsafe impl NativeHeap for JemallocHeap {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        use std::alloc::GlobalAlloc;

        if layout.size() == 0 {
            return None;
        }
        // SAFETY: layout has a non-zero size
        NonNull::new(unsafe { tikv_jemallocator::Jemalloc.alloc(layout) })
    }

    #[inline]
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        use std::alloc::GlobalAlloc;

        tikv_jemallocator::Jemalloc.dealloc(ptr.as_ptr(), layout);
    }

    fn name(&self) -> &'static str {
        "jemalloc"
    }
}
