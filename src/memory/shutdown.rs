/*!
 * Shutdown Sweep
 *
 * Last-resort release of every block still tracked when the process ends.
 *
 * Every allocator registers a `Weak` reference here when it is built. Rust
 * does not run destructors for statics at exit, so the sweep is driven by a
 * [`ShutdownGuard`] held in `main` (or by calling [`sweep`] directly). The
 * sweep runs at most once per process; each block it finds is logged as a
 * leak, followed by one elevated hint when the sweep found any.
 *
 * ```no_run
 * fn main() {
 *     let _sweep = offheap::shutdown::install();
 *     // ... allocate, use, free ...
 * } // sweep runs here
 * ```
 */

use super::manager::AllocatorState;
use super::types::{ReleaseCause, SweepReport};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{error, info, info_span, warn};

static REGISTRY: Mutex<Vec<Weak<AllocatorState>>> = parking_lot::const_mutex(Vec::new());
static SWEPT: AtomicBool = AtomicBool::new(false);

/// Register an allocator for the shutdown sweep
pub(crate) fn register(state: &Arc<AllocatorState>) {
    let mut registry = REGISTRY.lock();
    registry.retain(|entry| entry.strong_count() > 0);
    registry.push(Arc::downgrade(state));
}

/// Number of registered allocators still alive
pub fn registered() -> usize {
    REGISTRY
        .lock()
        .iter()
        .filter(|entry| entry.strong_count() > 0)
        .count()
}

/// Whether the shutdown sweep has already run in this process
pub fn has_swept() -> bool {
    SWEPT.load(Ordering::SeqCst)
}

/// Log each leaked block
pub(crate) fn report_leaks(report: &SweepReport) {
    for leak in &report.leaks {
        warn!(
            allocator = leak.allocator_id,
            address = %format_args!("0x{:x}", leak.address),
            size = leak.size,
            "Leak detected: off-heap block was never released"
        );
    }
}

/// Release every block of every live allocator, once per process
///
/// Returns `None` if the sweep already ran.
pub fn sweep() -> Option<SweepReport> {
    if SWEPT.swap(true, Ordering::SeqCst) {
        return None;
    }

    let _span = info_span!("shutdown_sweep").entered();

    let allocators: Vec<Arc<AllocatorState>> = REGISTRY
        .lock()
        .drain(..)
        .filter_map(|entry| entry.upgrade())
        .collect();

    let mut report = SweepReport::default();
    for state in &allocators {
        report.merge(state.sweep(ReleaseCause::Swept));
    }
    report_leaks(&report);
    if !report.is_empty() {
        error!(
            blocks = report.leaked_blocks(),
            bytes = report.leaked_bytes(),
            "Off-heap blocks outlived their owners. Audit explicit release: call \
             Handle::free or drop handles before shutdown"
        );
    }

    info!(
        allocators = allocators.len(),
        leaked_blocks = report.leaked_blocks(),
        leaked_bytes = report.leaked_bytes(),
        report = %serde_json::to_string(&report).unwrap_or_default(),
        "Shutdown sweep complete"
    );

    Some(report)
}

/// Runs the shutdown sweep when dropped
#[must_use = "the sweep runs when the guard is dropped"]
pub struct ShutdownGuard {
    _private: (),
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        sweep();
    }
}

/// Arm the shutdown sweep; hold the guard for the life of `main`
pub fn install() -> ShutdownGuard {
    info!("Shutdown sweep armed");
    ShutdownGuard { _private: () }
}
