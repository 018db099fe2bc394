//! Tracing/logging initialization.

use tracing::Span;
use tracing_subscriber::EnvFilter;

use reqkit_core::ExecutionContext;

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Span correlating everything logged inside it with `ctx`.
///
/// Absent user/tenant ids are recorded as empty fields.
pub fn context_span(ctx: &ExecutionContext) -> Span {
    tracing::info_span!(
        "request",
        trace_id = %ctx.trace_id(),
        user_id = ctx.user_id().unwrap_or_default(),
        tenant_id = ctx.tenant_id().unwrap_or_default(),
    )
}
