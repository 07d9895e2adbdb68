//! Hotel-side room lock record and its state machine.
//!
//! The lock engine's safety invariant lives on top of these records:
//! for any room, locks with an *active* status (`Held` or `Confirmed`)
//! form a non-overlapping family of half-open date intervals.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lock lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockStatus {
    Held,
    Confirmed,
    Released,
    Expired,
}

impl LockStatus {
    /// Storage / wire encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            LockStatus::Held => "HELD",
            LockStatus::Confirmed => "CONFIRMED",
            LockStatus::Released => "RELEASED",
            LockStatus::Expired => "EXPIRED",
        }
    }

    /// Parse the storage encoding.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HELD" => Some(LockStatus::Held),
            "CONFIRMED" => Some(LockStatus::Confirmed),
            "RELEASED" => Some(LockStatus::Released),
            "EXPIRED" => Some(LockStatus::Expired),
            _ => None,
        }
    }

    /// Whether a lock in this status blocks the room's interval.
    pub fn is_active(&self) -> bool {
        matches!(self, LockStatus::Held | LockStatus::Confirmed)
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict half-open interval overlap: `[a_start, a_end)` vs `[b_start, b_end)`.
///
/// Touching boundaries (`a_end == b_start`) do not overlap.
pub fn overlaps(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Refusals from the lock state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("lock already released")]
    AlreadyReleased,
    #[error("lock already expired")]
    AlreadyExpired,
    #[error("hold expired")]
    HoldExpired,
    #[error("lock is not held")]
    NotHeld,
}

/// Outcome of a transition attempt that did not refuse.
///
/// `Unchanged` marks the idempotent re-application cases: the caller
/// must not write the row back or touch counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockTransition {
    Applied(RoomLock),
    Unchanged(RoomLock),
}

impl LockTransition {
    pub fn into_lock(self) -> RoomLock {
        match self {
            LockTransition::Applied(lock) | LockTransition::Unchanged(lock) => lock,
        }
    }
}

/// A room lock as persisted by the hotel service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomLock {
    pub id: Uuid,
    /// Idempotency key; unique across all locks.
    pub request_id: String,
    pub room_id: Uuid,
    /// Half-open interval `[start_date, end_date)`.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only meaningful while `Held`.
    pub expires_at: DateTime<Utc>,
    pub correlation_id: String,
}

impl RoomLock {
    /// Construct the HELD row inserted by a successful hold.
    #[allow(clippy::too_many_arguments)]
    pub fn new_held(
        request_id: String,
        room_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        correlation_id: String,
        now: DateTime<Utc>,
        hold_ttl: chrono::Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            room_id,
            start_date,
            end_date,
            status: LockStatus::Held,
            created_at: now,
            updated_at: now,
            expires_at: now + hold_ttl,
            correlation_id,
        }
    }

    /// Whether a HELD lock has outlived its TTL.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == LockStatus::Held && self.expires_at < now
    }

    /// Promote a hold to a committed booking.
    ///
    /// Redundant confirms are `Unchanged`; released and expired locks
    /// refuse, as does a hold past its `expires_at` even if the sweeper
    /// has not caught it yet.
    pub fn confirm(self, now: DateTime<Utc>) -> Result<LockTransition, TransitionError> {
        match self.status {
            LockStatus::Confirmed => Ok(LockTransition::Unchanged(self)),
            LockStatus::Released => Err(TransitionError::AlreadyReleased),
            LockStatus::Expired => Err(TransitionError::HoldExpired),
            LockStatus::Held if self.expires_at < now => Err(TransitionError::HoldExpired),
            LockStatus::Held => Ok(LockTransition::Applied(RoomLock {
                status: LockStatus::Confirmed,
                updated_at: now,
                ..self
            })),
        }
    }

    /// Voluntarily abandon a hold.
    ///
    /// A release against a CONFIRMED lock is `Unchanged`: a late
    /// compensation must not silently undo a committed booking.
    pub fn release(self, now: DateTime<Utc>) -> Result<LockTransition, TransitionError> {
        match self.status {
            LockStatus::Released => Ok(LockTransition::Unchanged(self)),
            LockStatus::Confirmed => Ok(LockTransition::Unchanged(self)),
            LockStatus::Expired => Err(TransitionError::AlreadyExpired),
            LockStatus::Held => Ok(LockTransition::Applied(RoomLock {
                status: LockStatus::Released,
                updated_at: now,
                ..self
            })),
        }
    }

    /// Sweeper transition for a hold past its TTL.
    pub fn expire(self, now: DateTime<Utc>) -> Result<RoomLock, TransitionError> {
        match self.status {
            LockStatus::Held => Ok(RoomLock {
                status: LockStatus::Expired,
                updated_at: now,
                ..self
            }),
            _ => Err(TransitionError::NotHeld),
        }
    }
}
