/*!
 * Memory Types
 * Errors, diagnostics and statistics for off-heap allocation
 */

use crate::core::types::{Address, AllocatorId, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Off-heap operation result
pub type OffHeapResult<T> = Result<T, OffHeapError>;

/// Why the native heap could not satisfy a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Zero-byte requests are rejected before reaching the native heap
    ZeroSize,
    /// Size and alignment do not form a valid layout
    InvalidLayout,
    /// The native heap returned null
    OutOfMemory,
    /// The native heap handed out an address that is still tracked
    DuplicateAddress,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureReason::ZeroSize => write!(f, "zero-sized request"),
            FailureReason::InvalidLayout => write!(f, "invalid layout"),
            FailureReason::OutOfMemory => write!(f, "native heap exhausted"),
            FailureReason::DuplicateAddress => write!(f, "native heap returned a live address"),
        }
    }
}

/// Off-heap errors
///
/// Only allocation and configuration can fail. Release paths never return
/// errors; their faults are logged and counted instead.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum OffHeapError {
    #[error("Allocation failure: {size} bytes (align {align}): {reason}")]
    #[diagnostic(
        code(offheap::allocation_failure),
        help("The allocator itself is still usable. Check the requested size and available memory.")
    )]
    AllocationFailure {
        size: Size,
        align: Size,
        reason: FailureReason,
    },

    #[error("Invalid allocator configuration: {0}")]
    #[diagnostic(
        code(offheap::invalid_config),
        help("Check OFFHEAP_* environment variables or the AllocatorConfig passed to the builder.")
    )]
    InvalidConfig(String),

    #[error("Failed to start reclaim worker: {0}")]
    #[diagnostic(
        code(offheap::worker_spawn),
        help("The OS refused to create a thread. Check process thread limits.")
    )]
    WorkerSpawn(String),
}

/// Fault raised on a release path
///
/// Never propagated: the reclaim worker and the shutdown sweep must stay
/// available for the rest of the process lifetime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReclaimFault {
    #[error("native free panicked for 0x{address:x}: {message}")]
    NativeFreePanicked { address: Address, message: String },

    #[error("reclaim notice for 0x{address:x} panicked: {message}")]
    NoticePanicked { address: Address, message: String },
}

/// Render a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// What triggered a block's release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseCause {
    /// `Handle::free` or `Allocator::release`
    Explicit,
    /// Handle dropped without release
    Reclaimed,
    /// `release_all` or the shutdown sweep
    Swept,
    /// Allocator state dropped with blocks still pending reclaim
    Teardown,
}

impl fmt::Display for ReleaseCause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReleaseCause::Explicit => write!(f, "explicit"),
            ReleaseCause::Reclaimed => write!(f, "reclaimed"),
            ReleaseCause::Swept => write!(f, "swept"),
            ReleaseCause::Teardown => write!(f, "teardown"),
        }
    }
}

/// A block found live by a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakReport {
    pub allocator_id: AllocatorId,
    pub address: Address,
    pub size: Size,
}

/// Outcome of `release_all` or a shutdown sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub leaks: Vec<LeakReport>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.leaks.is_empty()
    }

    pub fn leaked_blocks(&self) -> usize {
        self.leaks.len()
    }

    pub fn leaked_bytes(&self) -> Size {
        self.leaks.iter().map(|leak| leak.size).sum()
    }

    pub fn merge(&mut self, other: SweepReport) {
        self.leaks.extend(other.leaks);
    }
}

/// Allocator statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorStats {
    pub allocator_id: AllocatorId,
    pub live_blocks: usize,
    pub live_bytes: Size,
    pub peak_bytes: Size,
    pub allocations: u64,
    pub allocation_failures: u64,
    pub explicit_releases: u64,
    pub reclaimed: u64,
    /// Released by `release_all` or the shutdown sweep
    pub swept: u64,
    pub reclaim_faults: u64,
}

impl AllocatorStats {
    /// Total blocks released through any path
    pub fn released(&self) -> u64 {
        self.explicit_releases + self.reclaimed + self.swept
    }
}
