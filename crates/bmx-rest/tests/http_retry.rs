//! Integration tests for the REST executor against a mock Axum server.
//!
//! Exercises the status classification state machine: retry ceilings,
//! fatal categories, idempotent DELETE, rate-limit waits, and the
//! authentication headers attached to every attempt.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use bmx_rest::{Credential, RestClient, RestConfig};
use reqwest::Method;
use serde_json::{json, Value};

const API_KEY: &str = "test-key";
const API_SECRET: &str = "test-secret";

async fn start_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test server");
    let addr = listener.local_addr().expect("missing local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server failed");
    });
    addr
}

fn client_for(addr: SocketAddr) -> RestClient {
    RestClient::new(RestConfig {
        base_url: format!("http://{addr}/"),
        api_key: API_KEY.to_string(),
        api_secret: API_SECRET.to_string(),
        agent_name: "test_agent".to_string(),
        timeout: Duration::from_secs(2),
        ..RestConfig::default()
    })
    .expect("failed to create client")
}

fn overloaded() -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": {"message": "The system is currently overloaded", "name": "HTTPError"}})),
    )
}

#[tokio::test]
async fn test_retry_ceiling_on_repeated_503() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/unavailable",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                overloaded()
            }
        }),
    );
    let addr = start_server(router).await;
    let client = client_for(addr);

    let err = client
        .execute("unavailable", &[], None, None, None, Some(2))
        .await
        .expect_err("should exhaust retries");

    assert_eq!(err.code, 503);
    assert!(err.is_5xx());
    assert!(err.message.contains("Max retries"));
    // initial attempt + exactly 2 retries, never a 4th request
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_401_is_fatal_with_zero_retries() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/secure",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"message": "Invalid API Key", "name": "HTTPError"}})),
                )
            }
        }),
    );
    let addr = start_server(router).await;
    let client = client_for(addr);

    let err = client
        .execute("secure", &[], None, None, None, Some(3))
        .await
        .expect_err("401 must surface");

    assert_eq!(err.code, 401);
    assert!(err.is_4xx());
    assert!(err.message.contains("Invalid API Key"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_404_treated_as_success() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/order",
        delete(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::NOT_FOUND, Json(json!({"error": {"message": "Not Found"}})))
            }
        }),
    );
    let addr = start_server(router).await;
    let client = client_for(addr);

    let result = client
        .execute("order", &[], None, Some(Method::DELETE), None, None)
        .await
        .expect("DELETE on absent target is success");

    assert_eq!(result, Value::Null);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_404_is_surfaced() {
    let router = Router::new().route(
        "/order",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({"error": {"message": "Not Found"}}))) }),
    );
    let addr = start_server(router).await;
    let client = client_for(addr);

    let err = client
        .execute("order", &[], None, None, None, None)
        .await
        .expect_err("404 on GET must surface");
    assert_eq!(err.code, 404);
}

#[tokio::test]
async fn test_429_waits_for_reset_then_retries() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/limited",
        get(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    // reset instant already in the past: the clamped wait is zero
                    let reset = chrono::Utc::now().timestamp() - 5;
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        [("x-ratelimit-reset", reset.to_string())],
                        Json(json!({"error": {"message": "Rate limit exceeded"}})),
                    )
                        .into_response()
                } else {
                    Json(json!({"ok": true})).into_response()
                }
            }
        }),
    );
    let addr = start_server(router).await;
    let client = client_for(addr);

    let result = client
        .execute("limited", &[], None, None, None, None)
        .await
        .expect("rate limiting must be invisible on eventual success");

    assert_eq!(result["ok"], true);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_429_sleeps_until_a_future_reset() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/limited",
        get(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    // whole-second arithmetic: a reset 2s ahead yields a
                    // wait of at least 1s regardless of subsecond phase
                    let reset = chrono::Utc::now().timestamp() + 2;
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        [("x-ratelimit-reset", reset.to_string())],
                        Json(json!({"error": {"message": "Rate limit exceeded"}})),
                    )
                        .into_response()
                } else {
                    Json(json!({"ok": true})).into_response()
                }
            }
        }),
    );
    let addr = start_server(router).await;
    let client = client_for(addr);

    let started = std::time::Instant::now();
    let result = client
        .execute("limited", &[], None, None, None, None)
        .await
        .expect("retry after the reset succeeds");

    assert_eq!(result["ok"], true);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_post_not_retried_by_default() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/unavailable",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                overloaded()
            }
        }),
    );
    let addr = start_server(router).await;
    let client = client_for(addr);

    let err = client
        .execute("unavailable", &[], Some(json!({"orders": []})), None, None, None)
        .await
        .expect_err("POST gets no retry budget by default");

    assert_eq!(err.code, 503);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timeouts_retry_with_zero_delay_as_code_999() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/slow",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({"ok": true}))
            }
        }),
    );
    let addr = start_server(router).await;
    let client = client_for(addr);

    let started = std::time::Instant::now();
    let err = client
        .execute(
            "slow",
            &[],
            None,
            None,
            Some(Duration::from_millis(200)),
            Some(2),
        )
        .await
        .expect_err("timeouts must exhaust the budget");

    assert_eq!(err.code, 999);
    assert!(err.is_timeout());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    // zero-delay retries: three 200ms attempts, no backoff sleeps
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_success_resets_retry_counter() {
    let flaky_hits = Arc::new(AtomicUsize::new(0));
    let broken_hits = Arc::new(AtomicUsize::new(0));
    let flaky_counter = flaky_hits.clone();
    let broken_counter = broken_hits.clone();
    let router = Router::new()
        .route(
            "/flaky",
            get(move || {
                let counter = flaky_counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        overloaded().into_response()
                    } else {
                        Json(json!({"ok": true})).into_response()
                    }
                }
            }),
        )
        .route(
            "/broken",
            get(move || {
                let counter = broken_counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    overloaded()
                }
            }),
        );
    let addr = start_server(router).await;
    let client = client_for(addr);

    client
        .execute("flaky", &[], None, None, None, None)
        .await
        .expect("second attempt succeeds");
    assert_eq!(flaky_hits.load(Ordering::SeqCst), 2);

    // the earlier retry must not have consumed this call's budget
    let err = client
        .execute("broken", &[], None, None, None, Some(1))
        .await
        .expect_err("broken endpoint exhausts its own budget");
    assert_eq!(err.code, 503);
    assert_eq!(broken_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_auth_headers_carry_a_valid_signature() {
    let router = Router::new().route(
        "/echo-auth",
        post(move |headers: HeaderMap, body: String| async move {
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            };
            let expires: i64 = header("api-expires").parse().unwrap_or(0);
            let expected =
                Credential::new(API_KEY, API_SECRET).sign("POST", "/echo-auth", expires, &body);
            Json(json!({
                "key_ok": header("api-key") == API_KEY,
                "sig_ok": header("api-signature") == expected,
                "content_type_ok": header("content-type") == "application/json",
                "agent_ok": header("user-agent") == "test_agent",
                "expires_in_future": expires > chrono::Utc::now().timestamp(),
            }))
        }),
    );
    let addr = start_server(router).await;
    let client = client_for(addr);

    let result = client
        .execute(
            "echo-auth",
            &[],
            Some(json!({"symbol": "XBTUSD", "orderQty": 1})),
            None,
            None,
            None,
        )
        .await
        .expect("echo endpoint succeeds");

    assert_eq!(result["key_ok"], true, "api-key header mismatch");
    assert_eq!(result["sig_ok"], true, "signature mismatch");
    assert_eq!(result["content_type_ok"], true);
    assert_eq!(result["agent_ok"], true);
    assert_eq!(result["expires_in_future"], true);
}
