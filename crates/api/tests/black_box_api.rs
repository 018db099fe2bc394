use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use reqwest::StatusCode;

use reqkit_api::{PROBLEM_JSON_CONTENT_TYPE, problem_response};
use reqkit_core::{ExecutionContext, Scope, StructuredError};
use reqkit_infra::{RetryConfig, Sleeper, execute};

/// Counts backoff pauses without waiting.
#[derive(Default)]
struct CountingSleeper {
    calls: AtomicUsize,
}

impl Sleeper for CountingSleeper {
    fn sleep(&self, _duration: Duration) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
struct AppState {
    retry: RetryConfig,
}

fn context_from_headers(headers: &HeaderMap) -> ExecutionContext {
    let mut scope = Scope::background();
    if let Some(trace_id) = headers.get("x-trace-id").and_then(|v| v.to_str().ok()) {
        scope = scope.with_trace_id(trace_id);
    }
    ExecutionContext::derive_from(&scope)
}

async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = context_from_headers(&headers);
    let instance = format!("/payments/{id}");
    let mut attempts = 0;

    let result = execute(&state.retry, || -> anyhow::Result<String> {
        attempts += 1;
        match id.as_str() {
            "flaky" if attempts < 3 => Err(anyhow::anyhow!("connection reset by peer")),
            "flaky" => Ok(format!("payment {id}")),
            "missing" => Err(StructuredError::not_found("payment_not_found", "Payment not found")
                .with_detail(format!("No payment with id {id}"))
                .into()),
            "invalid" => Err(StructuredError::validation(
                "invalid_payment_data",
                "The payment request is invalid",
            )
            .with_validation_error("amount", ["Amount needs to be positive"])
            .with_validation_error("currency", ["currency is required"])
            .into()),
            _ => Err(anyhow::anyhow!("db password is hunter2")),
        }
    });

    match result {
        Ok(body) => body.into_response(),
        Err(err) => problem_response(&ctx, err.as_ref(), instance),
    }
}

struct TestServer {
    base_url: String,
    sleeper: Arc<CountingSleeper>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let sleeper = Arc::new(CountingSleeper::default());
        let state = AppState {
            retry: RetryConfig::new(3).with_sleeper(sleeper.clone()),
        };

        let app = Router::new()
            .route("/payments/:id", get(get_payment))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            sleeper,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn transient_failures_are_retried_away() {
    let server = TestServer::spawn().await;

    let res = reqwest::get(format!("{}/payments/flaky", server.base_url))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "payment flaky");
    assert_eq!(server.sleeper.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn not_found_becomes_problem_detail() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/payments/missing", server.base_url))
        .header("x-trace-id", "trace-from-gateway")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        PROBLEM_JSON_CONTENT_TYPE
    );
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"type":"payment_not_found","title":"Payment not found","status":404,"detail":"No payment with id missing","instance":"/payments/missing","traceId":"trace-from-gateway"}"#
    );
    // Terminal failure after three attempts: two pauses.
    assert_eq!(server.sleeper.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn validation_failure_lists_field_errors() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/payments/invalid", server.base_url))
        .header("x-trace-id", "9b1b4579-b455-4eed-ac80-923668593dcc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.text().await.unwrap(),
        "{\"type\":\"invalid_payment_data\",\"title\":\"The payment request is invalid\",\"status\":400,\"instance\":\"/payments/invalid\",\"traceId\":\"9b1b4579-b455-4eed-ac80-923668593dcc\",\"errors\":{\"amount\":[\"Amount needs to be positive\"],\"currency\":[\"currency is required\"]}}"
    );
}

#[tokio::test]
async fn unclassified_failure_is_opaque() {
    let server = TestServer::spawn().await;

    let res = reqwest::get(format!("{}/payments/other", server.base_url))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["type"], "unknown");
    assert_eq!(body["title"], "An error occurred, please contact support.");
    assert_eq!(body["status"], 500);
    assert!(body.get("detail").is_none());
    assert!(body.get("errors").is_none());
    assert!(!body["traceId"].as_str().unwrap().is_empty());
    assert!(!body.to_string().contains("hunter2"));
}
