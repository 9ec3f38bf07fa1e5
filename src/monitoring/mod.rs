/*!
 * Monitoring
 * Structured logging setup for allocator events
 */

mod tracer;

pub use tracer::{init_tracing, TraceOutput};
