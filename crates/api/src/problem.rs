//! Problem-detail envelope and the translation of failures into it.

use std::error::Error as StdError;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use reqkit_core::{ExecutionContext, FieldErrors, Severity, StructuredError};
use reqkit_observability::context_span;

/// `type` of envelopes built from unclassified failures.
pub const UNKNOWN_ERROR_TYPE: &str = "unknown";

/// `title` of envelopes built from unclassified failures.
pub const GENERIC_ERROR_TITLE: &str = "An error occurred, please contact support.";

/// Wire-level error envelope.
///
/// Field order is part of the wire contract: `type`, `title`, `status`,
/// `detail` (only when present), `instance`, `traceId`, `errors` (only when
/// non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{problem_type}: {title}")]
pub struct ProblemDetail {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "detail_is_empty")]
    pub detail: Option<String>,
    pub instance: String,
    #[serde(rename = "traceId")]
    pub trace_id: String,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
}

fn detail_is_empty(detail: &Option<String>) -> bool {
    detail.as_deref().is_none_or(str::is_empty)
}

impl ProblemDetail {
    fn classified(ctx: &ExecutionContext, err: &StructuredError, instance: String) -> Self {
        Self {
            problem_type: err.code().to_string(),
            title: err.message().to_string(),
            status: err.kind().status_code(),
            detail: err.detail().map(str::to_string),
            instance,
            trace_id: ctx.trace_id().to_string(),
            errors: err.validation_errors().clone(),
        }
    }

    /// Envelope that reveals nothing about the failure.
    fn unknown(ctx: &ExecutionContext, instance: String) -> Self {
        Self {
            problem_type: UNKNOWN_ERROR_TYPE.to_string(),
            title: GENERIC_ERROR_TITLE.to_string(),
            status: 500,
            detail: None,
            instance,
            trace_id: ctx.trace_id().to_string(),
            errors: FieldErrors::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Translate `err` into the envelope sent to the caller.
///
/// The first [`StructuredError`] in `err`'s source chain classifies it. Any
/// other failure becomes the generic `unknown` envelope; its text is logged
/// but never put on the wire. This never fails.
pub fn translate(
    ctx: &ExecutionContext,
    err: &(dyn StdError + 'static),
    instance: impl Into<String>,
) -> ProblemDetail {
    let instance = instance.into();
    let _span = context_span(ctx).entered();

    match StructuredError::find_in(err) {
        Some(structured) => {
            log_structured(structured, &instance);
            ProblemDetail::classified(ctx, structured, instance)
        }
        None => {
            error!(error = %err, instance = %instance, "unclassified failure");
            ProblemDetail::unknown(ctx, instance)
        }
    }
}

fn log_structured(err: &StructuredError, instance: &str) {
    let code = err.code();
    let kind = err.kind();
    let cause = err.cause().map(|c| c.to_string()).unwrap_or_default();

    match err.severity() {
        Severity::Low => debug!(code, %kind, instance, %cause, "request failed: {err}"),
        Severity::Medium => info!(code, %kind, instance, %cause, "request failed: {err}"),
        Severity::High => warn!(code, %kind, instance, %cause, "request failed: {err}"),
        Severity::Critical => error!(code, %kind, instance, %cause, "request failed: {err}"),
    }
}
