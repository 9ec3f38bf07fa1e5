/*!
 * Off-Heap Memory
 *
 * Manually managed raw memory outside Rust's owned collections, for large
 * array-like containers that need a deterministic footprint.
 *
 * - [`Allocator`]: allocate / release / release_all over a native heap
 * - [`Handle`]: one block, with unchecked typed get/put at byte offsets
 * - Reclaim worker: frees blocks whose handles were dropped without `free`
 * - [`shutdown`]: last-resort sweep that logs every block still live
 */

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use memory::{
    allocate, default_allocator, shutdown, Allocator, AllocatorBuilder, AllocatorConfig,
    AllocatorStats, FailureReason, Handle, LeakReport, NativeHeap, OffHeapError, OffHeapResult,
    Primitive, ReclaimMode, SweepReport, SystemHeap, TrackingMode,
};
pub use monitoring::init_tracing;
