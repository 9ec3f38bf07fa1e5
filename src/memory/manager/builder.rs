/*!
 * Allocator Builder
 * Assembles state, starts the reclaim worker and registers the shutdown sweep
 */

use super::{Allocator, AllocatorState};
use crate::core::types::AllocatorId;
use crate::memory::config::AllocatorConfig;
use crate::memory::native::SystemHeap;
use crate::memory::reclaim;
use crate::memory::shutdown;
use crate::memory::traits::NativeHeap;
use crate::memory::types::{OffHeapError, OffHeapResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

static NEXT_ALLOCATOR_ID: AtomicU64 = AtomicU64::new(1);

/// Builder for [`Allocator`]
pub struct AllocatorBuilder {
    config: AllocatorConfig,
    heap: Option<Arc<dyn NativeHeap>>,
}

impl AllocatorBuilder {
    /// Create a new Allocator builder
    pub fn new() -> Self {
        Self {
            config: AllocatorConfig::default(),
            heap: None,
        }
    }

    /// Use a full configuration
    pub fn with_config(mut self, config: AllocatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Back the allocator with a specific native heap (default: [`SystemHeap`])
    pub fn with_heap<H: NativeHeap>(mut self, heap: Arc<H>) -> Self {
        self.heap = Some(heap as Arc<dyn NativeHeap>);
        self
    }

    /// Validate, start the reclaim worker and register for the shutdown sweep
    pub fn build(self) -> OffHeapResult<Allocator> {
        self.config.validate()?;

        let id: AllocatorId = NEXT_ALLOCATOR_ID.fetch_add(1, Ordering::Relaxed);
        let heap = self.heap.unwrap_or_else(|| Arc::new(SystemHeap));
        let (notices, inbox) = flume::unbounded();

        let state = Arc::new(AllocatorState::new(id, self.config, heap, notices));
        reclaim::spawn_worker(&state, inbox)
            .map_err(|e| OffHeapError::WorkerSpawn(e.to_string()))?;
        shutdown::register(&state);

        info!(
            allocator = id,
            heap = state.heap.name(),
            tracking = ?state.config.tracking,
            reclaim = ?state.config.reclaim,
            alignment = state.config.alignment,
            "Off-heap allocator initialized"
        );

        Ok(Allocator::from_state(state))
    }
}

impl Default for AllocatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
