//! Trace identifier generation.

use uuid::Uuid;

/// Source of fresh trace identifiers.
///
/// Injected wherever a root scope is created, so tests can pin the value
/// instead of relying on a hidden global generator. Any `Fn() -> String`
/// closure is a generator.
pub trait TraceIdGenerator: Send + Sync {
    /// Produce a new trace identifier.
    fn generate(&self) -> String;
}

/// Random UUIDv4 trace identifiers in hyphenated textual form.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct UuidV4Generator;

impl TraceIdGenerator for UuidV4Generator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Always hands out the same identifier.
///
/// Useful when a caller already owns a correlation id (e.g. from an upstream
/// gateway) and wants every root scope to adopt it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedTraceIdGenerator(String);

impl FixedTraceIdGenerator {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl TraceIdGenerator for FixedTraceIdGenerator {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

impl<F> TraceIdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Generate an id, falling back to UUIDv4 if the generator yields nothing.
///
/// A trace id must never be empty once a context exists.
pub(crate) fn generate_non_empty(ids: &dyn TraceIdGenerator) -> String {
    let id = ids.generate();
    if id.is_empty() {
        UuidV4Generator.generate()
    } else {
        id
    }
}
