//! `reqkit-core` — request-scoped building blocks.
//!
//! This crate contains **pure** primitives (no transport or runtime concerns):
//! the execution context carried through a call chain and the structured
//! error model that failures are classified into.

pub mod context;
pub mod error;
pub mod id;

pub use context::{ExecutionContext, Scope};
pub use error::{
    Cause, ErrorKind, FieldError, FieldErrors, ParseTokenError, Severity, StructuredError,
    StructuredResult,
};
pub use id::{FixedTraceIdGenerator, TraceIdGenerator, UuidV4Generator};
