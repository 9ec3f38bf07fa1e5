/*!
 * Allocator Operations
 * allocate / release / release_all and introspection
 */

use super::tracking::BlockRecord;
use super::Allocator;
use crate::core::types::{Address, Size};
use crate::memory::handle::Handle;
use crate::memory::reclaim::WorkerMessage;
use crate::memory::shutdown::report_leaks;
use crate::memory::types::{
    AllocatorStats, FailureReason, OffHeapError, OffHeapResult, ReleaseCause, SweepReport,
};
use std::alloc::Layout;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, warn};

impl Allocator {
    /// Allocate `size` bytes of off-heap memory
    ///
    /// The contents are uninitialized. Fails with `AllocationFailure` for a
    /// zero size, an invalid layout, or when the native heap is exhausted;
    /// the allocator stays usable either way.
    pub fn allocate(&self, size: Size) -> OffHeapResult<Handle> {
        let state = &self.state;
        let align = state.config.alignment;
        let fail = |reason: FailureReason| {
            state
                .counters
                .allocation_failures
                .fetch_add(1, Ordering::Relaxed);
            OffHeapError::AllocationFailure {
                size,
                align,
                reason,
            }
        };

        if size == 0 {
            warn!(allocator = state.id, "Rejected zero-sized allocation");
            return Err(fail(FailureReason::ZeroSize));
        }

        let layout =
            Layout::from_size_align(size, align).map_err(|_| fail(FailureReason::InvalidLayout))?;

        let ptr = state.heap.allocate(layout).ok_or_else(|| {
            error!(
                allocator = state.id,
                heap = state.heap.name(),
                size,
                align,
                "Native heap could not satisfy allocation"
            );
            fail(FailureReason::OutOfMemory)
        })?;

        let address = ptr.as_ptr() as Address;
        let record = BlockRecord {
            size,
            layout,
            ticket: state.next_ticket(),
        };

        // Counted before the insert so a racing release never underflows
        let live = state.counters.live_bytes.fetch_add(size, Ordering::Relaxed) + size;
        if !state.blocks.insert(address, record) {
            state.counters.live_bytes.fetch_sub(size, Ordering::Relaxed);
            error!(
                allocator = state.id,
                address = %format_args!("0x{:x}", address),
                "Native heap returned an address that is still tracked"
            );
            return Err(fail(FailureReason::DuplicateAddress));
        }
        state.counters.peak_bytes.fetch_max(live, Ordering::Relaxed);
        state.counters.allocations.fetch_add(1, Ordering::Relaxed);
        state.trace_block("allocate", address, size);

        Ok(Handle::new(address, size, record.ticket, Arc::clone(state)))
    }

    /// Release `address`
    ///
    /// Idempotent: an address that is not tracked (already released through
    /// any path, or never allocated here) is ignored.
    pub fn release(&self, address: Address) {
        self.state
            .release_block(address, None, ReleaseCause::Explicit);
    }

    /// Release every tracked block, logging each as a leak
    ///
    /// Blocks allocated concurrently with the call may survive it.
    pub fn release_all(&self) -> SweepReport {
        let report = self.state.sweep(ReleaseCause::Swept);
        report_leaks(&report);
        report
    }

    /// Whether `address` is currently tracked
    pub fn is_live(&self, address: Address) -> bool {
        self.state.blocks.contains(address)
    }

    /// Number of tracked blocks
    pub fn tracked(&self) -> usize {
        self.state.blocks.len()
    }

    /// Size of the tracked block at `address`
    pub fn block_size(&self, address: Address) -> Option<Size> {
        self.state.blocks.get(address).map(|record| record.size)
    }

    /// Snapshot of tracked addresses
    pub fn tracked_addresses(&self) -> Vec<Address> {
        self.state.blocks.addresses()
    }

    /// Bytes held by tracked blocks, summed from the map
    pub fn tracked_bytes(&self) -> Size {
        self.state.blocks.bytes()
    }

    pub fn stats(&self) -> AllocatorStats {
        self.state.stats()
    }

    /// Wait until the reclaim worker has handled every notice queued before this call
    pub fn reclaim_pass(&self) {
        let (ack, done) = flume::bounded(1);
        if self.state.notices.send(WorkerMessage::Barrier(ack)).is_ok() {
            // Err means the worker is gone; nothing left to wait for
            let _ = done.recv();
        }
    }
}
