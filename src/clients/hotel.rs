//! Hotel gateway client.
//!
//! A narrow wire-level client for the hotel lock surface: three JSON
//! POSTs, each carrying the idempotency key and the correlation id.
//! Transient failures are retried with bounded jittered backoff; every
//! definitive refusal maps to a typed error the saga can classify.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::HotelGatewayConfig;
use crate::model::LockStatus;

/// Header carrying the correlation id on every request and response.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Lock state as returned by the hotel lock surface.
///
/// The saga only depends on the success/failure classification; the
/// payload is advisory.
#[derive(Debug, Clone, Deserialize)]
pub struct LockSnapshot {
    pub id: Uuid,
    pub request_id: String,
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LockStatus,
}

/// Errors surfaced by the hotel gateway.
///
/// Only `Transport` is retried inside the client; everything else is a
/// definitive outcome for the saga.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HotelClientError {
    #[error("hotel rejected request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("wrong lock state: {0}")]
    State(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {message}")]
    Unexpected { status: u16, message: String },
}

impl HotelClientError {
    /// Whether the gateway may retry the attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HotelClientError::Transport(_))
    }
}

/// The three lock operations, used to disambiguate 409 semantics:
/// a conflicting hold versus a disallowed state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockOperation {
    Hold,
    Confirm,
    Release,
}

impl LockOperation {
    fn path_segment(&self) -> &'static str {
        match self {
            LockOperation::Hold => "hold",
            LockOperation::Confirm => "confirm",
            LockOperation::Release => "release",
        }
    }
}

/// Determine if an HTTP status code is retryable.
///
/// Retries 408 (request timeout), 429 (rate limit), and 5xx (server
/// errors, covering 503/504). All other 4xx are definitive.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Map a definitive (non-retryable) HTTP status to a typed error.
fn classify_status(op: LockOperation, status: StatusCode, message: String) -> HotelClientError {
    match status {
        StatusCode::BAD_REQUEST => HotelClientError::Validation(message),
        StatusCode::NOT_FOUND => HotelClientError::NotFound(message),
        StatusCode::CONFLICT if op == LockOperation::Hold => HotelClientError::Conflict(message),
        StatusCode::CONFLICT => HotelClientError::State(message),
        _ => HotelClientError::Unexpected {
            status: status.as_u16(),
            message,
        },
    }
}

#[derive(Serialize)]
struct HoldBody<'a> {
    request_id: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Serialize)]
struct RequestIdBody<'a> {
    request_id: &'a str,
}

/// Error envelope returned by the hotel surface.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Wire-level interface to the hotel lock surface.
#[async_trait]
pub trait HotelClient: Send + Sync {
    async fn hold(
        &self,
        room_id: Uuid,
        request_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError>;

    async fn confirm(
        &self,
        room_id: Uuid,
        request_id: &str,
        correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError>;

    async fn release(
        &self,
        room_id: Uuid,
        request_id: &str,
        correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError>;
}

/// HTTP implementation of the hotel gateway.
pub struct HttpHotelClient {
    client: Client,
    config: HotelGatewayConfig,
}

impl HttpHotelClient {
    /// Create a new client with the per-attempt timeout baked into the
    /// underlying reqwest client.
    pub fn new(config: HotelGatewayConfig) -> Result<Self, HotelClientError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| HotelClientError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Backoff configuration for retries: bounded exponential, jittered.
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(300))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(self.config.max_retries as usize)
            .with_jitter()
    }

    /// One attempt of one lock operation.
    async fn post_once<B: Serialize>(
        &self,
        op: LockOperation,
        room_id: Uuid,
        body: &B,
        correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError> {
        let url = format!(
            "{}/rooms/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            room_id,
            op.path_segment()
        );

        let response = self
            .client
            .post(&url)
            .header(CORRELATION_HEADER, correlation_id)
            .json(body)
            .send()
            .await
            .map_err(|e| HotelClientError::Transport(e.to_string()))?;

        let status = response.status();

        if status.is_success() {
            let lock = response
                .json::<LockSnapshot>()
                .await
                .map_err(|e| HotelClientError::Transport(e.to_string()))?;
            debug!(%url, lock_status = %lock.status, "hotel call succeeded");
            return Ok(lock);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or_else(|_| text.chars().take(200).collect());

        if is_retryable_status(status) {
            warn!(%url, %status, %message, "hotel call returned retryable status");
            return Err(HotelClientError::Transport(format!(
                "HTTP {} - {}",
                status, message
            )));
        }

        Err(classify_status(op, status, message))
    }

    /// Run one operation with retry on transient failures.
    async fn post_with_retry<B: Serialize + Sync>(
        &self,
        op: LockOperation,
        room_id: Uuid,
        body: &B,
        correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError> {
        (|| async { self.post_once(op, room_id, body, correlation_id).await })
            .retry(self.backoff())
            .when(|e: &HotelClientError| e.is_retryable())
            .await
    }
}

#[async_trait]
impl HotelClient for HttpHotelClient {
    async fn hold(
        &self,
        room_id: Uuid,
        request_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError> {
        let body = HoldBody {
            request_id,
            start_date,
            end_date,
        };
        self.post_with_retry(LockOperation::Hold, room_id, &body, correlation_id)
            .await
    }

    async fn confirm(
        &self,
        room_id: Uuid,
        request_id: &str,
        correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError> {
        let body = RequestIdBody { request_id };
        self.post_with_retry(LockOperation::Confirm, room_id, &body, correlation_id)
            .await
    }

    async fn release(
        &self,
        room_id: Uuid,
        request_id: &str,
        correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError> {
        let body = RequestIdBody { request_id };
        self.post_with_retry(LockOperation::Release, room_id, &body, correlation_id)
            .await
    }
}
