//! Tracing/logging setup and context correlation.

/// Initialize process-wide logging.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration and per-context spans.
pub mod tracing;

pub use crate::tracing::context_span;
