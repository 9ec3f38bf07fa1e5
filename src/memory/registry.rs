/*!
 * Default Allocator
 *
 * Process-wide convenience instance. Nothing requires it: every API takes an
 * explicit `Allocator`.
 */

use super::config::AllocatorConfig;
use super::handle::Handle;
use super::manager::Allocator;
use super::types::OffHeapResult;
use crate::core::types::Size;
use parking_lot::Mutex;
use std::sync::OnceLock;
use tracing::warn;

static DEFAULT_ALLOCATOR: OnceLock<Allocator> = OnceLock::new();
static INIT: Mutex<()> = parking_lot::const_mutex(());

/// The default allocator, built from `AllocatorConfig::from_env` on first use
///
/// An invalid environment falls back to the default configuration. Fails only
/// if the reclaim worker cannot be spawned; a later call retries.
pub fn default_allocator() -> OffHeapResult<&'static Allocator> {
    if let Some(allocator) = DEFAULT_ALLOCATOR.get() {
        return Ok(allocator);
    }

    // Exactly one caller builds; the rest wait and reuse its allocator
    let _init = INIT.lock();
    if let Some(allocator) = DEFAULT_ALLOCATOR.get() {
        return Ok(allocator);
    }

    let config = AllocatorConfig::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring invalid OFFHEAP_* environment, using defaults");
        AllocatorConfig::default()
    });
    let allocator = Allocator::builder().with_config(config).build()?;
    Ok(DEFAULT_ALLOCATOR.get_or_init(|| allocator))
}

/// Allocate from the default allocator
pub fn allocate(size: Size) -> OffHeapResult<Handle> {
    default_allocator()?.allocate(size)
}
