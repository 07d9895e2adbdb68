//! Domain records and state transitions.
//!
//! Reservations and locks are plain records; transitions are functions
//! that return the next state (or a typed refusal) instead of mutating
//! in place. Validation lives here, at the module boundary, so both
//! service entry points apply the same rules.

mod lock;
mod reservation;
mod room;

pub use lock::{overlaps, LockStatus, LockTransition, RoomLock, TransitionError};
pub use reservation::{Reservation, ReservationStatus};
pub use room::Room;

use chrono::NaiveDate;

/// Errors rejecting a requested stay interval.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StayDatesError {
    #[error("start_date must be strictly before end_date")]
    EmptyRange,
    #[error("start_date must not be in the past")]
    InPast,
}

/// Validate a requested stay `[start_date, end_date)` against `today`.
///
/// Applied identically at the booking entry point and the hotel hold
/// entry point; the lock engine never stores an interval that fails it.
pub fn validate_stay(
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> Result<(), StayDatesError> {
    if start_date >= end_date {
        return Err(StayDatesError::EmptyRange);
    }
    if start_date < today {
        return Err(StayDatesError::InPast);
    }
    Ok(())
}
