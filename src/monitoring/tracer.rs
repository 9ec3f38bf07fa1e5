/*!
 * Tracing Setup
 *
 * Installs a `tracing-subscriber` registry for the allocator's events.
 *
 * Environment variables:
 * - RUST_LOG: log filter (default: info). Use `offheap=debug` together with
 *   `OFFHEAP_TRACE_EVENTS=1` to see every allocate/release/reclaim
 * - OFFHEAP_TRACE_JSON: JSON output (default: false)
 */

use crate::core::env::parse_flag;
use crate::core::limits::ENV_TRACE_JSON;
use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutput {
    /// Compact human-readable lines
    Compact,
    /// One JSON object per event
    Json,
}

impl TraceOutput {
    /// Format selected by OFFHEAP_TRACE_JSON
    pub fn from_env() -> Self {
        let json = std::env::var(ENV_TRACE_JSON)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        if json {
            TraceOutput::Json
        } else {
            TraceOutput::Compact
        }
    }
}

/// Install the global subscriber
///
/// Returns `false` if a subscriber was already installed (for example by a
/// previous call or by the host application); the existing one is kept.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match TraceOutput::from_env() {
        TraceOutput::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
            .is_ok(),
        TraceOutput::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok(),
    };

    if installed {
        info!("Structured tracing initialized");
    }
    installed
}
