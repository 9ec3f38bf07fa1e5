/*!
 * Allocator Configuration
 *
 * Defaults come from `core::limits`; `from_env` overlays OFFHEAP_* variables.
 */

use super::types::{OffHeapError, OffHeapResult};
use crate::core::limits::{
    DEFAULT_ALIGNMENT, ENV_ALIGNMENT, ENV_RECLAIM, ENV_SHARDS, ENV_TRACE_EVENTS, ENV_TRACKING,
    MAX_ALIGNMENT, RECLAIM_THREAD_PREFIX,
};
use crate::core::env::parse_flag;
use crate::core::shards::{default_shards, normalize_shards};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How the address map is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingMode {
    /// One mutex around one map
    #[default]
    Coarse,
    /// DashMap with the given shard count (power of two)
    Sharded { shards: usize },
}

/// What dropping an unreleased handle does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclaimMode {
    /// Queue a notice for the reclaim worker
    #[default]
    Deferred,
    /// Release inline on the dropping thread
    Immediate,
}

/// Allocator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Alignment of every block (power of two)
    pub alignment: usize,
    pub tracking: TrackingMode,
    pub reclaim: ReclaimMode,
    /// Emit allocation/release/reclaim events at debug instead of trace level
    pub trace_events: bool,
    /// Reclaim thread name prefix
    pub worker_name: String,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            tracking: TrackingMode::Coarse,
            reclaim: ReclaimMode::Deferred,
            trace_events: false,
            worker_name: RECLAIM_THREAD_PREFIX.to_string(),
        }
    }
}

impl AllocatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_tracking(mut self, tracking: TrackingMode) -> Self {
        self.tracking = tracking;
        self
    }

    /// Sharded tracking with the CPU-derived default shard count
    pub fn sharded(self) -> Self {
        self.with_tracking(TrackingMode::Sharded {
            shards: default_shards(),
        })
    }

    pub fn with_reclaim(mut self, reclaim: ReclaimMode) -> Self {
        self.reclaim = reclaim;
        self
    }

    pub fn with_trace_events(mut self, enabled: bool) -> Self {
        self.trace_events = enabled;
        self
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Defaults overlaid with OFFHEAP_* environment variables
    pub fn from_env() -> OffHeapResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    ///
    /// `OFFHEAP_SHARDS` only sizes a sharded map; without
    /// `OFFHEAP_TRACKING=sharded` it is logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> OffHeapResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_ALIGNMENT) {
            config.alignment = raw.trim().parse().map_err(|_| {
                OffHeapError::InvalidConfig(format!("{ENV_ALIGNMENT}={raw} is not an integer"))
            })?;
        }

        let shards = match lookup(ENV_SHARDS) {
            Some(raw) => Some(raw.trim().parse::<usize>().map_err(|_| {
                OffHeapError::InvalidConfig(format!("{ENV_SHARDS}={raw} is not an integer"))
            })?),
            None => None,
        };

        if let Some(raw) = lookup(ENV_TRACKING) {
            config.tracking = match raw.trim().to_ascii_lowercase().as_str() {
                "coarse" => TrackingMode::Coarse,
                "sharded" => TrackingMode::Sharded {
                    shards: shards.map(normalize_shards).unwrap_or_else(default_shards),
                },
                other => {
                    return Err(OffHeapError::InvalidConfig(format!(
                        "{ENV_TRACKING}={other} (expected coarse or sharded)"
                    )))
                }
            };
        }

        if let (Some(shards), TrackingMode::Coarse) = (shards, config.tracking) {
            warn!(
                shards,
                "{ENV_SHARDS} ignored: only applies with {ENV_TRACKING}=sharded"
            );
        }

        if let Some(raw) = lookup(ENV_RECLAIM) {
            config.reclaim = match raw.trim().to_ascii_lowercase().as_str() {
                "deferred" => ReclaimMode::Deferred,
                "immediate" => ReclaimMode::Immediate,
                other => {
                    return Err(OffHeapError::InvalidConfig(format!(
                        "{ENV_RECLAIM}={other} (expected deferred or immediate)"
                    )))
                }
            };
        }

        if let Some(raw) = lookup(ENV_TRACE_EVENTS) {
            config.trace_events = parse_flag(&raw);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OffHeapResult<()> {
        if !self.alignment.is_power_of_two() {
            return Err(OffHeapError::InvalidConfig(format!(
                "alignment {} is not a power of two",
                self.alignment
            )));
        }
        if self.alignment > MAX_ALIGNMENT {
            return Err(OffHeapError::InvalidConfig(format!(
                "alignment {} exceeds maximum {}",
                self.alignment, MAX_ALIGNMENT
            )));
        }
        if let TrackingMode::Sharded { shards } = self.tracking {
            if shards < 2 || !shards.is_power_of_two() {
                return Err(OffHeapError::InvalidConfig(format!(
                    "shard count {shards} must be a power of two greater than 1"
                )));
            }
        }
        if self.worker_name.is_empty() {
            return Err(OffHeapError::InvalidConfig(
                "worker name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
