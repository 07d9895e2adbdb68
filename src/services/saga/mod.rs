//! Reservation saga orchestrator.
//!
//! Drives the two-step forward path (hold → confirm) against the hotel
//! service and compensates with a release on any forward failure. The
//! PENDING insert is the commit point: once it exists the saga always
//! drives the reservation to CONFIRMED or CANCELLED, and a client never
//! observes PENDING.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clients::{HotelClient, HotelClientError};
use crate::model::{validate_stay, Reservation, ReservationStatus, StayDatesError};
use crate::storage::{ReservationStore, StorageError};

#[cfg(test)]
mod tests;

/// Result type for saga operations.
pub type Result<T> = std::result::Result<T, SagaError>;

/// Errors surfaced by the saga entry point.
///
/// Conflicts and hotel-side refusals are not errors here: they resolve
/// into a CANCELLED reservation, which is a successful saga outcome.
#[derive(Debug, thiserror::Error)]
pub enum SagaError {
    #[error("{0}")]
    Validation(#[from] StayDatesError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A reservation intent as it arrives at the saga boundary.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Client-supplied idempotency key; generated once when absent.
    pub request_id: Option<String>,
}

/// The saga orchestrator.
pub struct ReservationSaga {
    reservations: Arc<dyn ReservationStore>,
    hotel: Arc<dyn HotelClient>,
}

impl ReservationSaga {
    pub fn new(reservations: Arc<dyn ReservationStore>, hotel: Arc<dyn HotelClient>) -> Self {
        Self {
            reservations,
            hotel,
        }
    }

    /// Create a reservation, returning it in a terminal status.
    #[tracing::instrument(name = "saga.create_reservation", skip_all, fields(room_id = %request.room_id))]
    pub async fn create_reservation(&self, request: NewReservation) -> Result<Reservation> {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // Idempotency probe, before anything else: replays observe the
        // terminal outcome of the original request and issue zero hotel
        // calls, even when the replayed payload's dates have since
        // slipped into the past.
        if let Some(existing) = self.reservations.get_by_request_id(&request_id).await? {
            debug!(%request_id, status = %existing.status, "idempotent replay");
            return Ok(existing);
        }

        // Only a request about to enter the saga is validated.
        validate_stay(
            request.start_date,
            request.end_date,
            Utc::now().date_naive(),
        )?;

        let correlation_id = Uuid::new_v4().to_string();
        let reservation = Reservation::new_pending(
            request_id.clone(),
            request.user_id,
            request.room_id,
            request.start_date,
            request.end_date,
            correlation_id.clone(),
            Utc::now(),
        );

        match self.reservations.insert(&reservation).await {
            Ok(()) => {}
            // Two callers raced with the same request_id; exactly one
            // entered PENDING. The loser reads the winner's row.
            Err(StorageError::DuplicateRequestId(_)) => {
                debug!(%request_id, "lost duplicate-insert race, re-reading");
                return self
                    .reservations
                    .get_by_request_id(&request_id)
                    .await?
                    .ok_or_else(|| {
                        SagaError::Storage(StorageError::NotFound(format!(
                            "reservation {}",
                            request_id
                        )))
                    });
            }
            Err(e) => return Err(e.into()),
        }

        match self.drive_forward(&reservation).await {
            Ok(()) => {
                self.finish(&reservation, ReservationStatus::Confirmed)
                    .await?;
                info!(%request_id, %correlation_id, "reservation confirmed");
                Ok(reservation.with_status(ReservationStatus::Confirmed))
            }
            Err(failure) => {
                warn!(
                    %request_id,
                    %correlation_id,
                    error = %failure,
                    "forward path failed, compensating"
                );
                self.compensate(&reservation).await;
                self.finish(&reservation, ReservationStatus::Cancelled)
                    .await?;
                Ok(reservation.with_status(ReservationStatus::Cancelled))
            }
        }
    }

    /// hold → confirm, in order, no pipelining.
    async fn drive_forward(&self, reservation: &Reservation) -> std::result::Result<(), HotelClientError> {
        self.hotel
            .hold(
                reservation.room_id,
                &reservation.request_id,
                reservation.start_date,
                reservation.end_date,
                &reservation.correlation_id,
            )
            .await?;

        self.hotel
            .confirm(
                reservation.room_id,
                &reservation.request_id,
                &reservation.correlation_id,
            )
            .await?;

        Ok(())
    }

    /// Best-effort release. Failures are swallowed: the hotel-side
    /// sweeper reclaims the hold after its TTL.
    async fn compensate(&self, reservation: &Reservation) {
        if let Err(e) = self
            .hotel
            .release(
                reservation.room_id,
                &reservation.request_id,
                &reservation.correlation_id,
            )
            .await
        {
            warn!(
                request_id = %reservation.request_id,
                error = %e,
                "compensation release failed; sweeper will reclaim the hold"
            );
        }
    }

    /// Write the terminal status. The saga is the only writer of
    /// reservation rows, so a lost CAS indicates outside interference
    /// and is logged rather than retried.
    async fn finish(&self, reservation: &Reservation, status: ReservationStatus) -> Result<()> {
        let moved = self
            .reservations
            .transition_status(&reservation.request_id, ReservationStatus::Pending, status)
            .await?;
        if !moved {
            error!(
                request_id = %reservation.request_id,
                target = %status,
                "terminal write lost its precondition; reservation mutated outside the saga"
            );
        }
        Ok(())
    }
}
