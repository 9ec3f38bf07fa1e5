/*!
 * Core Types
 * Common types used across the allocator
 */

/// Raw address of an off-heap block
pub type Address = usize;

/// Size type for raw memory operations
pub type Size = usize;

/// Per-allocation sequence number binding a handle to its tracking record
pub type Ticket = u64;

/// Allocator instance identifier (unique per process)
pub type AllocatorId = u64;
