//! Unified SQL storage implementations.
//!
//! Shared implementations for the SQL backends (PostgreSQL, SQLite),
//! parameterized by database type via the `SqlDatabase` trait. Queries
//! are built with sea-query and rendered per backend.

mod lock_store;
mod reservation_store;
mod room_store;

pub use lock_store::SqlLockStore;
pub use reservation_store::SqlReservationStore;
pub use room_store::SqlRoomStore;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use super::{Result, StorageError};

/// Abstraction over a SQL backend: pool type, query rendering, DDL.
pub trait SqlDatabase {
    type Pool;

    /// Schema statements, one per entry.
    const RESERVATIONS_DDL: &'static [&'static str];
    const ROOM_LOCKS_DDL: &'static [&'static str];
    const ROOMS_DDL: &'static [&'static str];

    fn build_select(stmt: sea_query::SelectStatement) -> String;
    fn build_insert(stmt: sea_query::InsertStatement) -> String;
    fn build_update(stmt: sea_query::UpdateStatement) -> String;
}

/// Stored-timestamp encoding: RFC 3339 in UTC with fixed nine-digit
/// fractional seconds, so lexicographic TEXT comparison matches
/// chronological order and round-trips are exact.
pub(crate) fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidRow(format!("timestamp '{}': {}", value, e)))
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .map_err(|e| StorageError::InvalidRow(format!("date '{}': {}", value, e)))
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| StorageError::InvalidRow(format!("uuid '{}': {}", value, e)))
}

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::PostgresQueryBuilder;
    use sqlx::PgPool;

    use crate::storage::schema;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        const RESERVATIONS_DDL: &'static [&'static str] = schema::CREATE_RESERVATIONS_POSTGRES;
        const ROOM_LOCKS_DDL: &'static [&'static str] = schema::CREATE_ROOM_LOCKS_POSTGRES;
        const ROOMS_DDL: &'static [&'static str] = schema::CREATE_ROOMS_POSTGRES;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }
    }

    /// PostgreSQL reservation store.
    pub type PostgresReservationStore = super::SqlReservationStore<Postgres>;

    /// PostgreSQL lock store.
    pub type PostgresLockStore = super::SqlLockStore<Postgres>;

    /// PostgreSQL room store.
    pub type PostgresRoomStore = super::SqlRoomStore<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::SqliteQueryBuilder;
    use sqlx::SqlitePool;

    use crate::storage::schema;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        const RESERVATIONS_DDL: &'static [&'static str] = schema::CREATE_RESERVATIONS_SQLITE;
        const ROOM_LOCKS_DDL: &'static [&'static str] = schema::CREATE_ROOM_LOCKS_SQLITE;
        const ROOMS_DDL: &'static [&'static str] = schema::CREATE_ROOMS_SQLITE;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }
    }

    /// SQLite reservation store.
    pub type SqliteReservationStore = super::SqlReservationStore<Sqlite>;

    /// SQLite lock store.
    pub type SqliteLockStore = super::SqlLockStore<Sqlite>;

    /// SQLite room store.
    pub type SqliteRoomStore = super::SqlRoomStore<Sqlite>;
}
