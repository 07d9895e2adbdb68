//! REST surface for the booking saga.
//!
//! One entry point: `POST /bookings`. The saga runs on a spawned task so
//! a dropped client connection cannot abandon a PENDING reservation; the
//! handler merely awaits the outcome and may never get to deliver it.
//! Caller identity arrives via `X-User-Id` (filled in by the auth layer,
//! which is outside this service).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::clients::hotel::CORRELATION_HEADER;
use crate::model::{Reservation, ReservationStatus};
use crate::services::{NewReservation, ReservationSaga, SagaError};

/// Header carrying the authenticated caller's id.
pub const USER_HEADER: &str = "x-user-id";

/// Shared state for axum handlers.
type AppState = Arc<ReservationSaga>;

/// Start the REST server on the given port.
pub async fn serve(
    saga: Arc<ReservationSaga>,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(saga);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let actual_port = listener.local_addr()?.port();
    tracing::info!(port = actual_port, "booking surface listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(saga: Arc<ReservationSaga>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bookings", post(create_booking))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(saga)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn create_booking(
    State(saga): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BookingBody>,
) -> Response {
    let Some(user_id) = user_from(&headers) else {
        return error_response(StatusCode::BAD_REQUEST, "missing or malformed x-user-id");
    };

    let (start_date, end_date) = match (body.start_date.parse::<NaiveDate>(), body.end_date.parse::<NaiveDate>()) {
        (Ok(start), Ok(end)) => (start, end),
        _ => return error_response(StatusCode::BAD_REQUEST, "malformed date"),
    };

    let intent = NewReservation {
        user_id,
        room_id: body.room_id,
        start_date,
        end_date,
        request_id: body.request_id,
    };

    // Detached task: the saga finishes driving the reservation to a
    // terminal status even if this handler's future is dropped.
    let outcome = tokio::spawn(async move { saga.create_reservation(intent).await }).await;

    match outcome {
        Ok(Ok(reservation)) => booking_response(reservation),
        Ok(Err(SagaError::Validation(e))) => {
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Ok(Err(SagaError::Storage(e))) => {
            error!(error = %e, "booking failed on storage");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
        Err(join_error) => {
            error!(error = %join_error, "saga task aborted");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct BookingBody {
    room_id: Uuid,
    start_date: String,
    end_date: String,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Serialize)]
struct BookingResponse {
    id: Uuid,
    request_id: String,
    user_id: Uuid,
    room_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: ReservationStatus,
    correlation_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn user_from(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
}

fn booking_response(reservation: Reservation) -> Response {
    let correlation_id = reservation.correlation_id.clone();
    let body = BookingResponse {
        id: reservation.id,
        request_id: reservation.request_id,
        user_id: reservation.user_id,
        room_id: reservation.room_id,
        start_date: reservation.start_date,
        end_date: reservation.end_date,
        status: reservation.status,
        correlation_id: reservation.correlation_id,
    };
    (
        StatusCode::OK,
        [(CORRELATION_HEADER, correlation_id)],
        Json(body),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
