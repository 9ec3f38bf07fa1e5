/*!
 * Off-Heap Allocator
 *
 * Tracks every live native block from `allocate` until exactly one of three
 * release paths frees it:
 *
 * - **Explicit**: `Handle::free` or `Allocator::release`
 * - **Reclaim**: a handle dropped without release notifies the reclaim worker
 *   (or releases inline in `ReclaimMode::Immediate`)
 * - **Sweep**: `release_all`, the shutdown sweep, or allocator teardown
 *
 * ## Exactly-once release
 *
 * Every path goes through `TrackingMap::remove_with`. Only the caller that
 * removes the entry performs the native free, so racing paths can never free
 * one block twice. Reclaim notices carry the block's ticket; a notice whose
 * ticket no longer matches (the address was released and handed out again)
 * is a no-op.
 *
 * ## Locking
 *
 * - `Coarse`: one mutex per allocator, native free under the lock
 * - `Sharded`: DashMap shards, free after the owning shard unlocks
 */

mod allocator;
mod builder;
mod state;
pub(crate) mod tracking;

pub use builder::AllocatorBuilder;

pub(crate) use state::AllocatorState;

use crate::core::types::AllocatorId;
use std::fmt;
use std::sync::Arc;

/// Off-heap allocator
///
/// Cheap to clone; clones share one tracking map and one reclaim worker.
#[derive(Clone)]
pub struct Allocator {
    pub(crate) state: Arc<AllocatorState>,
}

impl Allocator {
    /// Allocator with the default configuration over the system heap
    pub fn new() -> crate::memory::OffHeapResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> AllocatorBuilder {
        AllocatorBuilder::new()
    }

    pub(crate) fn from_state(state: Arc<AllocatorState>) -> Self {
        Self { state }
    }

    /// Process-unique allocator id
    pub fn id(&self) -> AllocatorId {
        self.state.id
    }

    pub fn config(&self) -> &crate::memory::AllocatorConfig {
        &self.state.config
    }

    /// Whether two values refer to the same allocator
    pub fn same_as(&self, other: &Allocator) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("id", &self.state.id)
            .field("heap", &self.state.heap.name())
            .field("tracked", &self.state.blocks.len())
            .field("config", &self.state.config)
            .finish()
    }
}
