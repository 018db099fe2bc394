//! Structured error model.
//!
//! Failures are classified into a closed set of [`ErrorKind`]s, each with a
//! default [`Severity`]. A [`StructuredError`] carries a stable machine code, a
//! human message, optional detail, an optional wrapped cause and per-field
//! validation messages.

use core::fmt;
use core::str::FromStr;
use std::error::Error as StdError;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Result type for operations failing with a [`StructuredError`].
pub type StructuredResult<T> = Result<T, StructuredError>;

/// Wrapped underlying failure.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Closed taxonomy of failure kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Internal,
    NotFound,
    Validation,
    Permission,
    #[serde(alias = "unauthorised")]
    Unauthorized,
    Conflict,
    Timeout,
    Cancelled,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::Internal,
        ErrorKind::NotFound,
        ErrorKind::Validation,
        ErrorKind::Permission,
        ErrorKind::Unauthorized,
        ErrorKind::Conflict,
        ErrorKind::Timeout,
        ErrorKind::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Internal => "internal",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Permission => "permission",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        }
    }

    /// Severity assigned when a constructor doesn't say otherwise.
    ///
    /// Only `Internal` failures are unexpected; everything else is a normal
    /// outcome of bad input or caller state.
    pub fn default_severity(&self) -> Severity {
        match self {
            ErrorKind::Internal => Severity::High,
            _ => Severity::Low,
        }
    }

    /// HTTP-style status code for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Internal => 500,
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 400,
            ErrorKind::Permission => 403,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Conflict => 409,
            ErrorKind::Timeout => 408,
            ErrorKind::Cancelled => 202,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(ErrorKind::Internal),
            "not_found" => Ok(ErrorKind::NotFound),
            "validation" => Ok(ErrorKind::Validation),
            "permission" => Ok(ErrorKind::Permission),
            "unauthorized" | "unauthorised" => Ok(ErrorKind::Unauthorized),
            "conflict" => Ok(ErrorKind::Conflict),
            "timeout" => Ok(ErrorKind::Timeout),
            "cancelled" => Ok(ErrorKind::Cancelled),
            other => Err(ParseTokenError::new("error kind", other)),
        }
    }
}

/// How urgently a failure needs attention.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Expected failures, e.g. validation.
    Low,
    /// Not urgent to look into.
    Medium,
    /// Shouldn't happen, but the system keeps working.
    High,
    /// Stops the system from working.
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(ParseTokenError::new("severity", other)),
        }
    }
}

/// An unknown kind/severity token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {what}: {token:?}")]
pub struct ParseTokenError {
    what: &'static str,
    token: String,
}

impl ParseTokenError {
    fn new(what: &'static str, token: &str) -> Self {
        Self {
            what,
            token: token.to_string(),
        }
    }
}

/// Messages for one input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    identifier: String,
    messages: Vec<String>,
}

impl FieldError {
    pub fn new<I, M>(identifier: impl Into<String>, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Self {
            identifier: identifier.into(),
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// Field identifier → ordered messages.
///
/// Keeps insertion order of fields (first time seen) and of messages within a
/// field. Adding to an existing field appends; it never replaces.
/// Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<I, M>(&mut self, field: impl Into<String>, messages: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        let field = field.into();
        let messages = messages.into_iter().map(Into::<String>::into);

        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => existing.extend(messages),
            None => self.entries.push((field, messages.collect())),
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, messages) in &self.entries {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

impl From<FieldError> for FieldErrors {
    fn from(err: FieldError) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(err.identifier, err.messages);
        errors
    }
}

/// A classified failure.
///
/// `kind` is fixed at construction. Everything else can be enriched through
/// the `with_*` combinators (or `add_*` when building in a loop) before the
/// value is returned up the stack.
#[derive(Debug, Clone)]
pub struct StructuredError {
    code: String,
    kind: ErrorKind,
    severity: Severity,
    message: String,
    detail: Option<String>,
    cause: Option<Cause>,
    validation_errors: FieldErrors,
}

impl StructuredError {
    pub fn new(
        code: impl Into<String>,
        kind: ErrorKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            kind,
            severity,
            message: message.into(),
            detail: None,
            cause: None,
            validation_errors: FieldErrors::new(),
        }
    }

    /// Build an error of `kind` with that kind's default severity.
    pub fn of_kind(code: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(code, kind, kind.default_severity(), message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::of_kind(code, ErrorKind::Internal, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::of_kind(code, ErrorKind::NotFound, message)
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::of_kind(code, ErrorKind::Validation, message)
    }

    pub fn permission(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::of_kind(code, ErrorKind::Permission, message)
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::of_kind(code, ErrorKind::Unauthorized, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::of_kind(code, ErrorKind::Conflict, message)
    }

    pub fn timeout(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::of_kind(code, ErrorKind::Timeout, message)
    }

    pub fn cancelled(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::of_kind(code, ErrorKind::Cancelled, message)
    }

    /// Set the extended explanation. An empty string clears it.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.detail = if detail.is_empty() { None } else { Some(detail) };
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach the underlying failure, replacing any previous cause.
    pub fn wrap<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Attach an already shared cause (e.g. another error's [`Cause`]).
    pub fn wrap_shared(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_validation_error<I, M>(mut self, field: impl Into<String>, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.add_validation_error(field, messages);
        self
    }

    /// Append messages to `field`, creating it if absent.
    pub fn add_validation_error<I, M>(&mut self, field: impl Into<String>, messages: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.validation_errors.add(field, messages);
    }

    pub fn add_field_error(&mut self, err: FieldError) {
        self.validation_errors.add(err.identifier, err.messages);
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn validation_errors(&self) -> &FieldErrors {
        &self.validation_errors
    }

    /// Find the first `StructuredError` in `err`'s source chain, `err` included.
    pub fn find_in<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a StructuredError> {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(found) = e.downcast_ref::<StructuredError>() {
                return Some(found);
            }
            current = e.source();
        }
        None
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for StructuredError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}
