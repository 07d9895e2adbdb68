//! Wire-contract tests for the hotel lock surface: envelope shape,
//! status codes, and correlation echo, exercised with a plain HTTP
//! client against the real router.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use staylock::handlers::hotel_rest;
use staylock::model::RoomLock;
use staylock::services::LockEngine;
use staylock::storage::{MockLockStore, MockRoomStore};

struct Surface {
    base_url: String,
    http: reqwest::Client,
    rooms: Arc<MockRoomStore>,
    locks: Arc<MockLockStore>,
}

async fn surface() -> Surface {
    let locks = Arc::new(MockLockStore::new());
    let rooms = Arc::new(MockRoomStore::new());
    let engine = Arc::new(LockEngine::new(
        locks.clone(),
        rooms.clone(),
        Duration::minutes(15),
    ));

    let app = hotel_rest::router(engine);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Surface {
        base_url: format!("http://127.0.0.1:{}", port),
        http: reqwest::Client::new(),
        rooms,
        locks,
    }
}

fn future(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

impl Surface {
    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .header("x-correlation-id", "corr-wire-test")
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn hold(&self, room: Uuid, request_id: &str, start: NaiveDate, end: NaiveDate) -> reqwest::Response {
        self.post(
            &format!("/rooms/{}/hold", room),
            json!({
                "request_id": request_id,
                "start_date": start.to_string(),
                "end_date": end.to_string(),
            }),
        )
        .await
    }
}

#[tokio::test]
async fn test_health() {
    let s = surface().await;
    let response = s
        .http
        .get(format!("{}/health", s.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_hold_envelope_and_correlation_echo() {
    let s = surface().await;
    let room = s.rooms.seed_available().await;

    let response = s.hold(room, "req-1", future(1), future(3)).await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("x-correlation-id")
            .and_then(|v| v.to_str().ok()),
        Some("corr-wire-test")
    );

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["request_id"], "req-1");
    assert_eq!(body["room_id"], room.to_string());
    assert_eq!(body["status"], "HELD");
    assert_eq!(body["start_date"], future(1).to_string());
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn test_hold_conflict_is_409_without_internal_ids() {
    let s = surface().await;
    let room = s.rooms.seed_available().await;

    assert_eq!(s.hold(room, "req-1", future(1), future(3)).await.status(), 200);

    let response = s.hold(room, "req-2", future(2), future(4)).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(!message.contains("req-1"));
}

#[tokio::test]
async fn test_hold_unknown_room_is_404() {
    let s = surface().await;
    let response = s.hold(Uuid::new_v4(), "req-1", future(1), future(3)).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_hold_unavailable_room_is_409() {
    let s = surface().await;
    let room = s.rooms.seed_unavailable().await;
    let response = s.hold(room, "req-1", future(1), future(3)).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_hold_validation_is_400() {
    let s = surface().await;
    let room = s.rooms.seed_available().await;

    // Past start date.
    let past = s.hold(room, "req-1", future(-2), future(3)).await;
    assert_eq!(past.status(), 400);

    // Unparseable date.
    let malformed = s
        .post(
            &format!("/rooms/{}/hold", room),
            json!({
                "request_id": "req-2",
                "start_date": "not-a-date",
                "end_date": future(3).to_string(),
            }),
        )
        .await;
    assert_eq!(malformed.status(), 400);
}

#[tokio::test]
async fn test_hold_replay_returns_same_row() {
    let s = surface().await;
    let room = s.rooms.seed_available().await;

    let first: Value = s
        .hold(room, "req-1", future(1), future(3))
        .await
        .json()
        .await
        .unwrap();
    let replay: Value = s
        .hold(room, "req-1", future(1), future(3))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first["id"], replay["id"]);
}

#[tokio::test]
async fn test_confirm_unknown_lock_is_404() {
    let s = surface().await;
    let response = s
        .post(
            &format!("/rooms/{}/confirm", Uuid::new_v4()),
            json!({"request_id": "missing"}),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_confirm_then_release_keeps_confirmed() {
    let s = surface().await;
    let room = s.rooms.seed_available().await;

    s.hold(room, "req-1", future(1), future(3)).await;

    let confirm = s
        .post(&format!("/rooms/{}/confirm", room), json!({"request_id": "req-1"}))
        .await;
    assert_eq!(confirm.status(), 200);
    let confirmed: Value = confirm.json().await.unwrap();
    assert_eq!(confirmed["status"], "CONFIRMED");

    // Late compensation: 200, row unchanged.
    let release = s
        .post(&format!("/rooms/{}/release", room), json!({"request_id": "req-1"}))
        .await;
    assert_eq!(release.status(), 200);
    let released: Value = release.json().await.unwrap();
    assert_eq!(released["status"], "CONFIRMED");
}

#[tokio::test]
async fn test_confirm_after_release_is_409() {
    let s = surface().await;
    let room = s.rooms.seed_available().await;

    s.hold(room, "req-1", future(1), future(3)).await;
    s.post(&format!("/rooms/{}/release", room), json!({"request_id": "req-1"}))
        .await;

    let confirm = s
        .post(&format!("/rooms/{}/confirm", room), json!({"request_id": "req-1"}))
        .await;
    assert_eq!(confirm.status(), 409);
}

#[tokio::test]
async fn test_release_expired_lock_is_409() {
    let s = surface().await;
    let room = s.rooms.seed_available().await;

    let expired = RoomLock::new_held(
        "req-1".to_string(),
        room,
        future(1),
        future(3),
        "corr".to_string(),
        Utc::now(),
        Duration::minutes(15),
    )
    .expire(Utc::now())
    .unwrap();
    s.locks.seed(expired).await;

    let release = s
        .post(&format!("/rooms/{}/release", room), json!({"request_id": "req-1"}))
        .await;
    assert_eq!(release.status(), 409);
}

#[tokio::test]
async fn test_adjacent_holds_both_200() {
    let s = surface().await;
    let room = s.rooms.seed_available().await;

    assert_eq!(s.hold(room, "req-p", future(1), future(3)).await.status(), 200);
    assert_eq!(s.hold(room, "req-q", future(3), future(5)).await.status(), 200);
}

#[tokio::test]
async fn test_missing_correlation_header_gets_minted_one() {
    let s = surface().await;
    let room = s.rooms.seed_available().await;

    let response = s
        .http
        .post(format!("{}/rooms/{}/hold", s.base_url, room))
        .json(&json!({
            "request_id": "req-1",
            "start_date": future(1).to_string(),
            "end_date": future(3).to_string(),
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let echoed = response
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(!echoed.is_empty());
}
