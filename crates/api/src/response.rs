use std::error::Error as StdError;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use reqkit_core::ExecutionContext;

use crate::problem::{ProblemDetail, translate};

pub const PROBLEM_JSON_CONTENT_TYPE: &str = "application/problem+json";

impl IntoResponse for ProblemDetail {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, axum::Json(self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_JSON_CONTENT_TYPE),
        );
        response
    }
}

/// Translate `err` and render it as an HTTP response.
pub fn problem_response(
    ctx: &ExecutionContext,
    err: &(dyn StdError + 'static),
    instance: impl Into<String>,
) -> Response {
    translate(ctx, err, instance).into_response()
}
