/*!
 * Core Module
 * Fundamental types, limits, shard sizing and env parsing
 */

pub mod env;
pub mod limits;
pub mod shards;
pub mod types;

// Re-export for convenience
pub use shards::default_shards;
pub use types::*;
