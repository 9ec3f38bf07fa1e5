/*!
 * Memory Traits
 * Native allocation primitive and accessor element types
 */

use std::alloc::Layout;
use std::ptr::NonNull;

/// Native allocation primitive backing an allocator
///
/// # Safety
///
/// `allocate` must return either `None` or a pointer to at least
/// `layout.size()` writable bytes aligned to `layout.align()`, valid until the
/// same pointer is passed back to `free`. Distinct live allocations must not
/// overlap.
pub unsafe trait NativeHeap: Send + Sync + 'static {
    /// Request a block; `None` when the request cannot be satisfied
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Return a block to the native heap
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this heap with the same `layout`
    /// and must not have been freed already.
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);

    /// Name used in logs
    fn name(&self) -> &'static str {
        "native"
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width value the raw accessor can read and write
pub trait Primitive: sealed::Sealed + Copy + Send + Sync + 'static {
    /// Width in bytes
    const WIDTH: usize = std::mem::size_of::<Self>();
}

macro_rules! primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Primitive for $ty {}
        )*
    };
}

primitive!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);
