//! Gateway retry behavior against a scripted hotel stand-in.
//!
//! The stand-in fails a configurable number of attempts before
//! succeeding, which pins down the client's retry classification:
//! transient statuses are retried with backoff, definitive refusals are
//! surfaced immediately.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use staylock::clients::{HotelClient, HotelClientError, HttpHotelClient};
use staylock::config::HotelGatewayConfig;

/// Scripted behavior: fail `failures_remaining` attempts with
/// `fail_status`, then succeed.
struct Script {
    failures_remaining: AtomicU32,
    fail_status: u16,
    calls: AtomicU32,
    seen_correlation: Mutex<Option<String>>,
}

impl Script {
    fn new(failures: u32, fail_status: u16) -> Arc<Self> {
        Arc::new(Self {
            failures_remaining: AtomicU32::new(failures),
            fail_status,
            calls: AtomicU32::new(0),
            seen_correlation: Mutex::new(None),
        })
    }
}

async fn scripted_hold(
    State(script): State<Arc<Script>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    script.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(correlation) = headers.get("x-correlation-id").and_then(|v| v.to_str().ok()) {
        *script.seen_correlation.lock().await = Some(correlation.to_string());
    }

    let remaining = script.failures_remaining.load(Ordering::SeqCst);
    if remaining > 0 {
        script.failures_remaining.fetch_sub(1, Ordering::SeqCst);
        return (
            StatusCode::from_u16(script.fail_status).unwrap(),
            Json(json!({"error": "scripted failure"})),
        );
    }

    let today = Utc::now().date_naive();
    (
        StatusCode::OK,
        Json(json!({
            "id": Uuid::new_v4(),
            "request_id": "req-1",
            "room_id": Uuid::new_v4(),
            "start_date": (today + Duration::days(1)).to_string(),
            "end_date": (today + Duration::days(3)).to_string(),
            "status": "HELD",
        })),
    )
}

async fn serve_script(script: Arc<Script>) -> String {
    let app = Router::new()
        .route("/rooms/:room_id/hold", post(scripted_hold))
        .with_state(script);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

fn gateway(base_url: String, max_retries: u32) -> HttpHotelClient {
    HttpHotelClient::new(HotelGatewayConfig {
        base_url,
        timeout_ms: 2000,
        max_retries,
    })
    .unwrap()
}

async fn hold(client: &HttpHotelClient) -> Result<(), HotelClientError> {
    let today = Utc::now().date_naive();
    client
        .hold(
            Uuid::new_v4(),
            "req-1",
            today + Duration::days(1),
            today + Duration::days(3),
            "corr-retry-test",
        )
        .await
        .map(|_| ())
}

#[tokio::test]
async fn test_transient_failures_are_retried_to_success() {
    let script = Script::new(2, 503);
    let base_url = serve_script(script.clone()).await;
    let client = gateway(base_url, 3);

    hold(&client).await.unwrap();

    // Two failed attempts plus the success.
    assert_eq!(script.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_correlation_header_reaches_the_wire() {
    let script = Script::new(0, 503);
    let base_url = serve_script(script.clone()).await;
    let client = gateway(base_url, 3);

    hold(&client).await.unwrap();

    let seen = script.seen_correlation.lock().await.clone();
    assert_eq!(seen.as_deref(), Some("corr-retry-test"));
}

#[tokio::test]
async fn test_conflict_is_not_retried() {
    let script = Script::new(u32::MAX, 409);
    let base_url = serve_script(script.clone()).await;
    let client = gateway(base_url, 3);

    let err = hold(&client).await.unwrap_err();
    assert!(matches!(err, HotelClientError::Conflict(_)));
    assert_eq!(script.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_validation_is_not_retried() {
    let script = Script::new(u32::MAX, 400);
    let base_url = serve_script(script.clone()).await;
    let client = gateway(base_url, 3);

    let err = hold(&client).await.unwrap_err();
    assert!(matches!(err, HotelClientError::Validation(_)));
    assert_eq!(script.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_budget_exhaustion_surfaces_transport_error() {
    let script = Script::new(u32::MAX, 500);
    let base_url = serve_script(script.clone()).await;
    let client = gateway(base_url, 1);

    let err = hold(&client).await.unwrap_err();
    assert!(matches!(err, HotelClientError::Transport(_)));
    // Bounded: the initial attempt plus at most the configured retries.
    assert!(script.calls.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    // Nothing listens here; refusal is a transport error after retries.
    let client = gateway("http://127.0.0.1:9".to_string(), 0);
    let err = hold(&client).await.unwrap_err();
    assert!(matches!(err, HotelClientError::Transport(_)));
}
