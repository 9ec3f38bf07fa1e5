/*!
 * Shard Sizing
 *
 * CPU-topology-aware shard count for the sharded tracking map.
 * Power-of-2 counts keep DashMap's shard selection a bitwise AND.
 */

use super::limits::{FALLBACK_CPU_COUNT, MAX_SHARDS, MIN_SHARDS, SHARDS_PER_CPU};
use tracing::warn;

/// Number of CPUs available to this process
#[inline]
pub fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or_else(|e| {
            warn!(error = %e, fallback = FALLBACK_CPU_COUNT, "Failed to detect CPU count");
            FALLBACK_CPU_COUNT
        })
}

/// Default shard count: 4x CPU cores, rounded up to a power of two
#[inline]
pub fn default_shards() -> usize {
    normalize_shards(cpu_count() * SHARDS_PER_CPU)
}

/// Round a requested shard count to a power of two within bounds
#[inline]
pub fn normalize_shards(requested: usize) -> usize {
    requested.max(1).next_power_of_two().clamp(MIN_SHARDS, MAX_SHARDS)
}
