//! REST surface for the hotel lock engine.
//!
//! Three POST endpoints sharing one JSON envelope shape, plus a health
//! check. Every response echoes the caller's `X-Correlation-Id` (a
//! fresh one is minted for callers that omit it, e.g. operator tools).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::clients::hotel::CORRELATION_HEADER;
use crate::model::{LockStatus, RoomLock};
use crate::services::{EngineError, HoldCommand, LockEngine};

/// Shared state for axum handlers.
type AppState = Arc<LockEngine>;

/// Start the REST server on the given port.
///
/// When `port` is 0, the OS assigns an ephemeral port. The actual bound
/// port is always logged so it can be discovered.
pub async fn serve(
    engine: Arc<LockEngine>,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(engine);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let actual_port = listener.local_addr()?.port();
    tracing::info!(port = actual_port, "hotel lock surface listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(engine: Arc<LockEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms/:room_id/hold", post(hold))
        .route("/rooms/:room_id/confirm", post(confirm))
        .route("/rooms/:room_id/release", post(release))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(engine)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn hold(
    State(engine): State<AppState>,
    Path(room_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<HoldBody>,
) -> Response {
    let correlation_id = correlation_from(&headers);

    let (start_date, end_date) = match (parse_date(&body.start_date), parse_date(&body.end_date)) {
        (Ok(start), Ok(end)) => (start, end),
        _ => return error_response(StatusCode::BAD_REQUEST, "malformed date", &correlation_id),
    };

    let result = engine
        .hold(HoldCommand {
            request_id: body.request_id,
            room_id,
            start_date,
            end_date,
            correlation_id: correlation_id.clone(),
        })
        .await;

    lock_response(result, &correlation_id)
}

async fn confirm(
    State(engine): State<AppState>,
    Path(_room_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<RequestIdBody>,
) -> Response {
    let correlation_id = correlation_from(&headers);
    let result = engine.confirm(&body.request_id).await;
    lock_response(result, &correlation_id)
}

async fn release(
    State(engine): State<AppState>,
    Path(_room_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<RequestIdBody>,
) -> Response {
    let correlation_id = correlation_from(&headers);
    let result = engine.release(&body.request_id).await;
    lock_response(result, &correlation_id)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct HoldBody {
    request_id: String,
    start_date: String,
    end_date: String,
}

#[derive(Deserialize)]
struct RequestIdBody {
    request_id: String,
}

#[derive(Serialize)]
struct LockResponse {
    id: Uuid,
    request_id: String,
    room_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: LockStatus,
}

impl From<RoomLock> for LockResponse {
    fn from(lock: RoomLock) -> Self {
        Self {
            id: lock.id,
            request_id: lock.request_id,
            room_id: lock.room_id,
            start_date: lock.start_date,
            end_date: lock.end_date,
            status: lock.status,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn correlation_from(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    value.parse::<NaiveDate>()
}

fn lock_response(result: crate::services::lock_engine::Result<RoomLock>, correlation_id: &str) -> Response {
    match result {
        Ok(lock) => (
            StatusCode::OK,
            [(CORRELATION_HEADER, correlation_id.to_string())],
            Json(LockResponse::from(lock)),
        )
            .into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!(error = %e, %correlation_id, "lock operation failed");
            }
            error_response(status, &e.to_string(), correlation_id)
        }
    }
}

fn error_response(status: StatusCode, message: &str, correlation_id: &str) -> Response {
    (
        status,
        [(CORRELATION_HEADER, correlation_id.to_string())],
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Error → status mapping for the lock surface.
fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::RoomUnknown(_) | EngineError::LockUnknown(_) => StatusCode::NOT_FOUND,
        EngineError::RoomUnavailable(_) | EngineError::Conflict | EngineError::WrongState(_) => {
            StatusCode::CONFLICT
        }
        EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
