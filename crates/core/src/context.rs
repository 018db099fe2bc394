//! Request-scoped execution context.
//!
//! An [`ExecutionContext`] carries the identity and correlation data of one
//! unit of work (trace id, user id, tenant id) plus the cancellation signal and
//! optional deadline it inherited from its parent [`Scope`].
//!
//! Notes:
//! - The trace id is **never empty**. It is generated once per root scope and
//!   inherited unchanged by derived contexts unless explicitly overridden.
//! - `with_*` methods return a new value; the receiver and any other holders
//!   are never affected.
//! - Cancellation is read-only from this crate's perspective. Tasks observe
//!   it through [`ExecutionContext::cancellation`].

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::id::{TraceIdGenerator, UuidV4Generator, generate_non_empty};

/// Parent scope a context is created from.
///
/// This is what an inbound request hands over before any context exists: the
/// correlation data it happened to carry (e.g. from headers) and the
/// cancellation/deadline signal of the enclosing unit of work. Every field is
/// optional except the cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    trace_id: Option<String>,
    user_id: Option<String>,
    tenant_id: Option<String>,
    cancellation: CancellationToken,
    deadline: Option<DateTime<Utc>>,
}

impl Scope {
    /// An empty scope with its own, never-cancelled token.
    pub fn background() -> Self {
        Self::default()
    }

    /// A scope whose cancellation is driven by an existing token.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: token,
            ..Self::default()
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = non_empty(trace_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl From<&ExecutionContext> for Scope {
    fn from(ctx: &ExecutionContext) -> Self {
        Self {
            trace_id: Some(ctx.trace_id.clone()),
            user_id: ctx.user_id.clone(),
            tenant_id: ctx.tenant_id.clone(),
            cancellation: ctx.cancellation.clone(),
            deadline: ctx.deadline,
        }
    }
}

/// Identity and correlation carrier for one unit of work.
///
/// Cloning is cheap-ish and shares the cancellation signal; all other fields
/// are plain values.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    trace_id: String,
    user_id: Option<String>,
    tenant_id: Option<String>,
    cancellation: CancellationToken,
    deadline: Option<DateTime<Utc>>,
}

impl ExecutionContext {
    /// Start a fresh root context with no parent.
    pub fn background() -> Self {
        Self::new_root(&Scope::background())
    }

    /// Start a new root under `parent`.
    ///
    /// Always generates a fresh trace id; user and tenant are not inherited.
    /// The cancellation signal is a child of the parent's and the deadline is
    /// kept.
    pub fn new_root(parent: &Scope) -> Self {
        Self::new_root_with(parent, &UuidV4Generator)
    }

    pub fn new_root_with(parent: &Scope, ids: &dyn TraceIdGenerator) -> Self {
        Self {
            trace_id: generate_non_empty(ids),
            user_id: None,
            tenant_id: None,
            cancellation: parent.cancellation.child_token(),
            deadline: parent.deadline,
        }
    }

    /// Derive a context from `parent`, inheriting everything it carries.
    ///
    /// This is the normal entry point for request-scoped code. A trace id is
    /// generated only if the parent has none.
    pub fn derive_from(parent: &Scope) -> Self {
        Self::derive_from_with(parent, &UuidV4Generator)
    }

    pub fn derive_from_with(parent: &Scope, ids: &dyn TraceIdGenerator) -> Self {
        let trace_id = match parent.trace_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => generate_non_empty(ids),
        };

        Self {
            trace_id,
            user_id: parent.user_id.clone(),
            tenant_id: parent.tenant_id.clone(),
            cancellation: parent.cancellation.child_token(),
            deadline: parent.deadline,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// User id, if one was ever set.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Tenant id, if one was ever set.
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Whether the deadline (if any) has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn with_user_id(&self, user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..self.clone()
        }
    }

    pub fn with_tenant_id(&self, tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            ..self.clone()
        }
    }

    /// Override the trace id. An empty id is ignored.
    pub fn with_trace_id(&self, trace_id: impl Into<String>) -> Self {
        let trace_id = trace_id.into();
        if trace_id.is_empty() {
            return self.clone();
        }

        Self {
            trace_id,
            ..self.clone()
        }
    }

    pub fn with_deadline(&self, deadline: DateTime<Utc>) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// The scope this context represents, for deriving further contexts.
    pub fn scope(&self) -> Scope {
        Scope::from(self)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
