//! HTTP-facing error surface: failure → problem-detail envelope.

pub mod problem;
pub mod response;

pub use problem::{GENERIC_ERROR_TITLE, ProblemDetail, UNKNOWN_ERROR_TYPE, translate};
pub use response::{PROBLEM_JSON_CONTENT_TYPE, problem_response};
