/*!
 * Allocator State
 * Shared state behind every `Allocator` clone and `Handle`
 */

use super::tracking::{BlockRecord, TrackingMap};
use crate::core::types::{Address, AllocatorId, Size, Ticket};
use crate::memory::config::AllocatorConfig;
use crate::memory::reclaim::WorkerMessage;
use crate::memory::traits::NativeHeap;
use crate::memory::types::{
    panic_message, AllocatorStats, LeakReport, ReclaimFault, ReleaseCause, SweepReport,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Lifetime counters
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub allocations: AtomicU64,
    pub allocation_failures: AtomicU64,
    pub explicit_releases: AtomicU64,
    pub reclaimed: AtomicU64,
    pub swept: AtomicU64,
    pub reclaim_faults: AtomicU64,
    pub live_bytes: AtomicUsize,
    pub peak_bytes: AtomicUsize,
}

pub(crate) struct AllocatorState {
    pub(crate) id: AllocatorId,
    pub(crate) config: AllocatorConfig,
    pub(crate) heap: Arc<dyn NativeHeap>,
    pub(crate) blocks: TrackingMap,
    pub(crate) notices: flume::Sender<WorkerMessage>,
    pub(crate) counters: Counters,
    next_ticket: AtomicU64,
}

impl AllocatorState {
    pub(crate) fn new(
        id: AllocatorId,
        config: AllocatorConfig,
        heap: Arc<dyn NativeHeap>,
        notices: flume::Sender<WorkerMessage>,
    ) -> Self {
        Self {
            id,
            blocks: TrackingMap::new(config.tracking),
            config,
            heap,
            notices,
            counters: Counters::default(),
            next_ticket: AtomicU64::new(1),
        }
    }

    #[inline]
    pub(crate) fn next_ticket(&self) -> Ticket {
        self.next_ticket.fetch_add(1, Ordering::Relaxed)
    }

    /// Emit a block event at debug level when `trace_events` is on, else at trace level
    pub(crate) fn trace_block(&self, action: &'static str, address: Address, size: Size) {
        if self.config.trace_events {
            debug!(
                allocator = self.id,
                action,
                address = %format_args!("0x{:x}", address),
                size,
                "off-heap block"
            );
        } else {
            trace!(
                allocator = self.id,
                action,
                address = %format_args!("0x{:x}", address),
                size,
                "off-heap block"
            );
        }
    }

    /// Untrack and natively free `address`
    ///
    /// With a ticket, only the allocation that ticket was issued for is
    /// released. Returns the released record, or `None` for an untracked
    /// address (a no-op, never an error).
    pub(crate) fn release_block(
        &self,
        address: Address,
        ticket: Option<Ticket>,
        cause: ReleaseCause,
    ) -> Option<BlockRecord> {
        let mut fault = None;
        let released = self.blocks.remove_with(address, ticket, |record| {
            fault = self.free_native(address, record).err();
        });

        let Some(record) = released else {
            debug!(
                allocator = self.id,
                address = %format_args!("0x{:x}", address),
                %cause,
                "Release of untracked address ignored"
            );
            return None;
        };

        self.counters
            .live_bytes
            .fetch_sub(record.size, Ordering::Relaxed);
        let counter = match cause {
            ReleaseCause::Explicit => &self.counters.explicit_releases,
            ReleaseCause::Reclaimed => &self.counters.reclaimed,
            ReleaseCause::Swept | ReleaseCause::Teardown => &self.counters.swept,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Some(fault) = fault {
            self.record_fault(&fault);
        }

        self.trace_block(
            match cause {
                ReleaseCause::Explicit => "release",
                ReleaseCause::Reclaimed => "reclaim",
                ReleaseCause::Swept => "sweep",
                ReleaseCause::Teardown => "teardown",
            },
            address,
            record.size,
        );
        Some(record)
    }

    /// Native free with panics contained
    fn free_native(&self, address: Address, record: &BlockRecord) -> Result<(), ReclaimFault> {
        let Some(ptr) = NonNull::new(address as *mut u8) else {
            return Ok(());
        };
        // SAFETY: the record was just removed from the map, so this block came
        // from `self.heap` with `record.layout` and nobody else will free it
        catch_unwind(AssertUnwindSafe(|| unsafe {
            self.heap.free(ptr, record.layout)
        }))
        .map_err(|payload| ReclaimFault::NativeFreePanicked {
            address,
            message: panic_message(payload.as_ref()),
        })
    }

    pub(crate) fn record_fault(&self, fault: &ReclaimFault) {
        self.counters.reclaim_faults.fetch_add(1, Ordering::Relaxed);
        error!(allocator = self.id, error = %fault, "Release-path fault absorbed");
    }

    /// Release every block in a snapshot of the map
    pub(crate) fn sweep(&self, cause: ReleaseCause) -> SweepReport {
        let mut report = SweepReport::default();
        for address in self.blocks.addresses() {
            if let Some(record) = self.release_block(address, None, cause) {
                report.leaks.push(LeakReport {
                    allocator_id: self.id,
                    address,
                    size: record.size,
                });
            }
        }
        report
    }

    pub(crate) fn stats(&self) -> AllocatorStats {
        let c = &self.counters;
        AllocatorStats {
            allocator_id: self.id,
            live_blocks: self.blocks.len(),
            live_bytes: c.live_bytes.load(Ordering::Relaxed),
            peak_bytes: c.peak_bytes.load(Ordering::Relaxed),
            allocations: c.allocations.load(Ordering::Relaxed),
            allocation_failures: c.allocation_failures.load(Ordering::Relaxed),
            explicit_releases: c.explicit_releases.load(Ordering::Relaxed),
            reclaimed: c.reclaimed.load(Ordering::Relaxed),
            swept: c.swept.load(Ordering::Relaxed),
            reclaim_faults: c.reclaim_faults.load(Ordering::Relaxed),
        }
    }
}

impl Drop for AllocatorState {
    /// Every handle is gone by now. Blocks still tracked are pending reclaims
    /// the worker can no longer serve, or were given up with `Handle::leak`.
    fn drop(&mut self) {
        let report = self.sweep(ReleaseCause::Teardown);
        if !report.is_empty() {
            debug!(
                allocator = self.id,
                blocks = report.leaked_blocks(),
                bytes = report.leaked_bytes(),
                "Allocator dropped, freed pending blocks"
            );
        }
    }
}
