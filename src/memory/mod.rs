/*!
 * Memory Module
 * Off-heap allocation, raw access, reclamation and the shutdown sweep
 */

pub mod config;
pub mod handle;
pub mod manager;
pub mod native;
pub mod reclaim;
pub mod registry;
pub mod shutdown;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use config::{AllocatorConfig, ReclaimMode, TrackingMode};
pub use handle::Handle;
pub use manager::{Allocator, AllocatorBuilder};
#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
pub use native::JemallocHeap;
pub use native::SystemHeap;
pub use reclaim::ReclaimNotice;
pub use registry::{allocate, default_allocator};
pub use shutdown::ShutdownGuard;
pub use traits::{NativeHeap, Primitive};
pub use types::*;
