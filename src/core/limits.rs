/*!
 * Allocator Limits and Constants
 *
 * Centralized location for defaults, thresholds and environment keys.
 */

// =============================================================================
// ALLOCATION
// =============================================================================

/// Default block alignment (8 bytes)
/// Matches the widest primitive the accessor reads or writes
pub const DEFAULT_ALIGNMENT: usize = 8;

/// Largest alignment accepted from configuration (one 4KB page)
pub const MAX_ALIGNMENT: usize = 4 * 1024;

// =============================================================================
// TRACKING
// =============================================================================

/// Lower bound for sharded tracking maps
pub const MIN_SHARDS: usize = 8;

/// Upper bound for sharded tracking maps
/// [PERF] Diminishing returns past this point, every shard costs a lock
pub const MAX_SHARDS: usize = 512;

/// Shards per CPU core for the sharded tracking map
pub const SHARDS_PER_CPU: usize = 4;

/// Fallback CPU count when topology detection fails
pub const FALLBACK_CPU_COUNT: usize = 8;

// =============================================================================
// RECLAIM WORKER
// =============================================================================

/// Thread name prefix for reclaim workers; the allocator id is appended
pub const RECLAIM_THREAD_PREFIX: &str = "offheap-reclaim";

// =============================================================================
// ENVIRONMENT
// =============================================================================

pub const ENV_ALIGNMENT: &str = "OFFHEAP_ALIGNMENT";
pub const ENV_TRACKING: &str = "OFFHEAP_TRACKING";
pub const ENV_SHARDS: &str = "OFFHEAP_SHARDS";
pub const ENV_RECLAIM: &str = "OFFHEAP_RECLAIM";
pub const ENV_TRACE_EVENTS: &str = "OFFHEAP_TRACE_EVENTS";

/// Enables JSON log output in `init_tracing`
pub const ENV_TRACE_JSON: &str = "OFFHEAP_TRACE_JSON";
