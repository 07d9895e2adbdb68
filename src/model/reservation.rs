//! Booking-side reservation record.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation lifecycle status.
///
/// `Pending` is the only non-terminal status; the saga drives every
/// reservation to `Confirmed` or `Cancelled` before responding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    /// Storage / wire encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse the storage encoding.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(ReservationStatus::Pending),
            "CONFIRMED" => Some(ReservationStatus::Confirmed),
            "CANCELLED" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation as persisted by the booking service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: Uuid,
    /// Idempotency key; unique across all reservations.
    pub request_id: String,
    pub user_id: Uuid,
    pub room_id: Uuid,
    /// Half-open stay interval `[start_date, end_date)`.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ReservationStatus,
    pub correlation_id: String,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Construct the PENDING row the saga persists at its commit point.
    pub fn new_pending(
        request_id: String,
        user_id: Uuid,
        room_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        correlation_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            user_id,
            room_id,
            start_date,
            end_date,
            status: ReservationStatus::Pending,
            correlation_id,
            created_at: now,
        }
    }

    /// Copy with the given terminal status.
    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::Cancelled,
        ] {
            assert_eq!(ReservationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReservationStatus::parse("HELD"), None);
    }

    #[test]
    fn test_terminality() {
        assert!(!ReservationStatus::Pending.is_terminal());
        assert!(ReservationStatus::Confirmed.is_terminal());
        assert!(ReservationStatus::Cancelled.is_terminal());
    }
}
