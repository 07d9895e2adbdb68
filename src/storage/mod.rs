//! Reservation, lock, and room persistence.
//!
//! This module contains:
//! - `ReservationStore`, `LockStore`, `RoomStore` traits
//! - Storage configuration types
//! - Implementations: PostgreSQL, SQLite (feature-gated), in-memory mock

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::model::{LockStatus, Reservation, ReservationStatus, Room, RoomLock};

// Implementation modules
pub mod mock;
#[cfg(any(feature = "postgres", feature = "sqlite"))]
pub mod schema;
#[cfg(any(feature = "postgres", feature = "sqlite"))]
pub mod sql;

// Re-exports
pub use mock::{MockLockStore, MockReservationStore, MockRoomStore};
#[cfg(feature = "postgres")]
pub use sql::postgres::{PostgresLockStore, PostgresReservationStore, PostgresRoomStore};
#[cfg(feature = "sqlite")]
pub use sql::sqlite::{SqliteLockStore, SqliteReservationStore, SqliteRoomStore};

// ============================================================================
// Traits
// ============================================================================

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Unique `request_id` constraint violated; exactly one caller wins
    /// the insert race, the rest see this.
    #[error("duplicate request_id: {0}")]
    DuplicateRequestId(String),

    #[error("row not found: {0}")]
    NotFound(String),

    #[error("invalid stored row: {0}")]
    InvalidRow(String),

    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Interface for reservation persistence (booking side).
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Insert a new reservation.
    ///
    /// Fails with [`StorageError::DuplicateRequestId`] when a row with
    /// the same `request_id` already exists.
    async fn insert(&self, reservation: &Reservation) -> Result<()>;

    /// Look up by idempotency key.
    async fn get_by_request_id(&self, request_id: &str) -> Result<Option<Reservation>>;

    /// Compare-and-set the status of the reservation with the given
    /// `request_id`. Returns `true` when the row was in `from` and is
    /// now in `to`; `false` when the current status no longer matches.
    async fn transition_status(
        &self,
        request_id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<bool>;
}

/// Interface for room lock persistence (hotel side).
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Insert a new lock row.
    ///
    /// Fails with [`StorageError::DuplicateRequestId`] when a row with
    /// the same `request_id` already exists.
    async fn insert(&self, lock: &RoomLock) -> Result<()>;

    /// Look up by idempotency key.
    async fn get_by_request_id(&self, request_id: &str) -> Result<Option<RoomLock>>;

    /// All locks on the room with status HELD or CONFIRMED whose
    /// interval overlaps `[start_date, end_date)` (strict half-open
    /// comparison).
    async fn find_active_overlapping(
        &self,
        room_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RoomLock>>;

    /// Compare-and-set write of `lock` conditioned on the row currently
    /// holding status `from`. Returns `true` when the row transitioned.
    async fn transition(&self, lock: &RoomLock, from: LockStatus) -> Result<bool>;

    /// HELD locks whose `expires_at` is strictly before `now`.
    async fn find_expired_held(&self, now: DateTime<Utc>) -> Result<Vec<RoomLock>>;
}

/// Interface for the room registry (hotel side).
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn get(&self, room_id: Uuid) -> Result<Option<Room>>;

    /// Insert or replace a room entry (seeding and admin tooling).
    async fn upsert(&self, room: &Room) -> Result<()>;

    /// Atomically bump the room's bookings counter.
    async fn increment_times_booked(&self, room_id: Uuid) -> Result<()>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Storage type discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Sqlite,
    Postgres,
}

/// Storage configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// SQLite-specific configuration.
    pub sqlite: SqliteConfig,
    /// PostgreSQL-specific configuration.
    pub postgres: PostgresConfig,
}

/// SQLite-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// SQLite connection URI.
    pub uri: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            uri: "sqlite:staylock.db?mode=rwc".to_string(),
        }
    }
}

/// PostgreSQL-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// PostgreSQL connection URI.
    pub uri: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            uri: "postgres://localhost:5432/staylock".to_string(),
        }
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Initialize the booking-side store based on configuration.
///
/// Requires the corresponding feature to be enabled:
/// - SQLite: `--features sqlite` (included in default)
/// - PostgreSQL: `--features postgres`
pub async fn init_reservation_store(
    config: &StorageConfig,
) -> std::result::Result<Arc<dyn ReservationStore>, Box<dyn std::error::Error>> {
    match config.storage_type {
        StorageType::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                info!("Storage: sqlite at {}", config.sqlite.uri);

                let pool = sqlx::SqlitePool::connect(&config.sqlite.uri).await?;
                let store = SqliteReservationStore::new(pool);
                store.init().await?;

                Ok(Arc::new(store))
            }

            #[cfg(not(feature = "sqlite"))]
            {
                Err("SQLite support requires the 'sqlite' feature. Rebuild with --features sqlite"
                    .into())
            }
        }
        StorageType::Postgres => {
            #[cfg(feature = "postgres")]
            {
                info!("Storage: postgres at {}", config.postgres.uri);

                let pool = sqlx::PgPool::connect(&config.postgres.uri).await?;
                let store = PostgresReservationStore::new(pool);
                store.init().await?;

                Ok(Arc::new(store))
            }

            #[cfg(not(feature = "postgres"))]
            {
                Err("PostgreSQL support requires the 'postgres' feature. Rebuild with --features postgres".into())
            }
        }
    }
}

/// Initialize the hotel-side stores based on configuration.
///
/// Returns (LockStore, RoomStore) sharing one connection pool.
pub async fn init_hotel_stores(
    config: &StorageConfig,
) -> std::result::Result<(Arc<dyn LockStore>, Arc<dyn RoomStore>), Box<dyn std::error::Error>> {
    match config.storage_type {
        StorageType::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                info!("Storage: sqlite at {}", config.sqlite.uri);

                let pool = sqlx::SqlitePool::connect(&config.sqlite.uri).await?;

                let lock_store = SqliteLockStore::new(pool.clone());
                lock_store.init().await?;

                let room_store = SqliteRoomStore::new(pool);
                room_store.init().await?;

                Ok((Arc::new(lock_store), Arc::new(room_store)))
            }

            #[cfg(not(feature = "sqlite"))]
            {
                Err("SQLite support requires the 'sqlite' feature. Rebuild with --features sqlite"
                    .into())
            }
        }
        StorageType::Postgres => {
            #[cfg(feature = "postgres")]
            {
                info!("Storage: postgres at {}", config.postgres.uri);

                let pool = sqlx::PgPool::connect(&config.postgres.uri).await?;

                let lock_store = PostgresLockStore::new(pool.clone());
                lock_store.init().await?;

                let room_store = PostgresRoomStore::new(pool);
                room_store.init().await?;

                Ok((Arc::new(lock_store), Arc::new(room_store)))
            }

            #[cfg(not(feature = "postgres"))]
            {
                Err("PostgreSQL support requires the 'postgres' feature. Rebuild with --features postgres".into())
            }
        }
    }
}
