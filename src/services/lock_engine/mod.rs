//! Room lock engine.
//!
//! Owns the central safety invariant: for any room, locks with status
//! HELD or CONFIRMED form a non-overlapping family of half-open date
//! intervals. The check-then-insert critical section is serialized per
//! room with a keyed mutex; the unique `request_id` index backstops
//! double insertion, so two concurrent conflicting holds cannot both
//! succeed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::{validate_stay, LockTransition, RoomLock, TransitionError};
use crate::storage::{LockStore, RoomStore, StorageError};


/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the lock engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("room {0} does not exist")]
    RoomUnknown(Uuid),

    #[error("room {0} is not available for booking")]
    RoomUnavailable(Uuid),

    #[error("no lock for request {0}")]
    LockUnknown(String),

    #[error("dates conflict with an existing booking")]
    Conflict,

    #[error("{0}")]
    WrongState(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A hold request as it arrives at the engine boundary.
#[derive(Debug, Clone)]
pub struct HoldCommand {
    pub request_id: String,
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub correlation_id: String,
}

/// The lock engine.
pub struct LockEngine {
    locks: Arc<dyn LockStore>,
    rooms: Arc<dyn RoomStore>,
    hold_ttl: chrono::Duration,
    /// Per-room critical-section guards, created on first use.
    room_guards: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockEngine {
    pub fn new(
        locks: Arc<dyn LockStore>,
        rooms: Arc<dyn RoomStore>,
        hold_ttl: chrono::Duration,
    ) -> Self {
        Self {
            locks,
            rooms,
            hold_ttl,
            room_guards: Mutex::new(HashMap::new()),
        }
    }

    /// The serialization guard for one room.
    fn guard_for(&self, room_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self.room_guards.lock().expect("room guard registry poisoned");
        guards
            .entry(room_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Acquire a hold on a room for a half-open date interval.
    #[tracing::instrument(
        name = "lock_engine.hold",
        skip_all,
        fields(request_id = %command.request_id, room_id = %command.room_id)
    )]
    pub async fn hold(&self, command: HoldCommand) -> Result<RoomLock> {
        let now = Utc::now();

        validate_stay(command.start_date, command.end_date, now.date_naive())
            .map_err(|e| EngineError::Validation(e.to_string()))?;

        // Idempotency probe: the identity of the request decides, not the
        // payload. A replayed hold returns the original row regardless of
        // its current status and never re-runs the conflict check.
        if let Some(existing) = self.locks.get_by_request_id(&command.request_id).await? {
            return Ok(existing);
        }

        let guard = self.guard_for(command.room_id);
        let _serialized = guard.lock().await;

        let room = self
            .rooms
            .get(command.room_id)
            .await?
            .ok_or(EngineError::RoomUnknown(command.room_id))?;
        if !room.available {
            return Err(EngineError::RoomUnavailable(command.room_id));
        }

        let conflicting = self
            .locks
            .find_active_overlapping(command.room_id, command.start_date, command.end_date)
            .await?;
        if !conflicting.is_empty() {
            return Err(EngineError::Conflict);
        }

        let lock = RoomLock::new_held(
            command.request_id.clone(),
            command.room_id,
            command.start_date,
            command.end_date,
            command.correlation_id.clone(),
            now,
            self.hold_ttl,
        );

        match self.locks.insert(&lock).await {
            Ok(()) => {
                info!(
                    correlation_id = %command.correlation_id,
                    expires_at = %lock.expires_at,
                    "hold acquired"
                );
                Ok(lock)
            }
            // A replay slipped in between the probe and the insert; the
            // first writer's row is the answer.
            Err(StorageError::DuplicateRequestId(_)) => self
                .locks
                .get_by_request_id(&command.request_id)
                .await?
                .ok_or_else(|| EngineError::LockUnknown(command.request_id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Promote a hold to a committed booking.
    #[tracing::instrument(name = "lock_engine.confirm", skip_all, fields(request_id = %request_id))]
    pub async fn confirm(&self, request_id: &str) -> Result<RoomLock> {
        loop {
            let current = self
                .locks
                .get_by_request_id(request_id)
                .await?
                .ok_or_else(|| EngineError::LockUnknown(request_id.to_string()))?;
            let previous_status = current.status;

            let now = Utc::now();
            match current.confirm(now) {
                Ok(LockTransition::Unchanged(lock)) => return Ok(lock),
                Ok(LockTransition::Applied(lock)) => {
                    if self.locks.transition(&lock, previous_status).await? {
                        // The counter is an at-least-once statistic, not a
                        // safety invariant; a failed bump is logged only.
                        if let Err(e) = self.rooms.increment_times_booked(lock.room_id).await {
                            warn!(room_id = %lock.room_id, error = %e, "times_booked bump failed");
                        }
                        info!(room_id = %lock.room_id, "hold confirmed");
                        return Ok(lock);
                    }
                    // Lost the CAS to a racing transition; re-read and
                    // re-dispatch on the fresh status.
                }
                Err(e) => return Err(map_confirm_refusal(e)),
            }
        }
    }

    /// Voluntarily abandon a hold.
    ///
    /// Releasing a CONFIRMED lock is a no-op that returns the row
    /// unchanged: a late compensation must not undo a committed booking.
    #[tracing::instrument(name = "lock_engine.release", skip_all, fields(request_id = %request_id))]
    pub async fn release(&self, request_id: &str) -> Result<RoomLock> {
        loop {
            let current = self
                .locks
                .get_by_request_id(request_id)
                .await?
                .ok_or_else(|| EngineError::LockUnknown(request_id.to_string()))?;
            let previous_status = current.status;

            match current.release(Utc::now()) {
                Ok(LockTransition::Unchanged(lock)) => return Ok(lock),
                Ok(LockTransition::Applied(lock)) => {
                    if self.locks.transition(&lock, previous_status).await? {
                        info!(room_id = %lock.room_id, "hold released");
                        return Ok(lock);
                    }
                }
                Err(e) => return Err(map_release_refusal(e)),
            }
        }
    }
}

fn map_confirm_refusal(error: TransitionError) -> EngineError {
    match error {
        TransitionError::AlreadyReleased => EngineError::WrongState("lock already released".into()),
        TransitionError::HoldExpired | TransitionError::AlreadyExpired => {
            EngineError::WrongState("hold expired".into())
        }
        TransitionError::NotHeld => EngineError::WrongState(error.to_string()),
    }
}

fn map_release_refusal(error: TransitionError) -> EngineError {
    match error {
        TransitionError::AlreadyExpired => {
            EngineError::WrongState("lock already in final status".into())
        }
        other => EngineError::WrongState(other.to_string()),
    }
}
