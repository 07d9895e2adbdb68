//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query
//! building. Dates are stored as ISO-8601 TEXT (lexicographic order
//! matches calendar order, so the strict `<`/`>` overlap probe works on
//! the raw columns); timestamps as RFC 3339 TEXT.

use sea_query::Iden;

/// Reservations table schema (booking side).
#[derive(Iden)]
pub enum Reservations {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "request_id"]
    RequestId,
    #[iden = "user_id"]
    UserId,
    #[iden = "room_id"]
    RoomId,
    #[iden = "start_date"]
    StartDate,
    #[iden = "end_date"]
    EndDate,
    #[iden = "status"]
    Status,
    #[iden = "correlation_id"]
    CorrelationId,
    #[iden = "created_at"]
    CreatedAt,
}

/// Room locks table schema (hotel side).
#[derive(Iden)]
pub enum RoomLocks {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "request_id"]
    RequestId,
    #[iden = "room_id"]
    RoomId,
    #[iden = "start_date"]
    StartDate,
    #[iden = "end_date"]
    EndDate,
    #[iden = "status"]
    Status,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
    #[iden = "expires_at"]
    ExpiresAt,
    #[iden = "correlation_id"]
    CorrelationId,
}

/// Rooms table schema (hotel side).
#[derive(Iden)]
pub enum Rooms {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "available"]
    Available,
    #[iden = "times_booked"]
    TimesBooked,
}

/// SQL for creating the reservations table, one statement per entry.
pub const CREATE_RESERVATIONS_SQLITE: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS reservations (
    id TEXT PRIMARY KEY,
    request_id TEXT NOT NULL UNIQUE,
    user_id TEXT NOT NULL,
    room_id TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL,
    correlation_id TEXT NOT NULL,
    created_at TEXT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_reservations_user ON reservations(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_reservations_status_created ON reservations(status, created_at)",
];

/// SQL for creating the room_locks table, one statement per entry.
///
/// The composite index backs the conflict probe.
pub const CREATE_ROOM_LOCKS_SQLITE: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS room_locks (
    id TEXT PRIMARY KEY,
    request_id TEXT NOT NULL UNIQUE,
    room_id TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    correlation_id TEXT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_room_locks_probe ON room_locks(room_id, status, start_date, end_date)",
    "CREATE INDEX IF NOT EXISTS idx_room_locks_expiry ON room_locks(status, expires_at)",
];

/// SQL for creating the rooms table.
pub const CREATE_ROOMS_SQLITE: &[&str] = &[r#"
CREATE TABLE IF NOT EXISTS rooms (
    id TEXT PRIMARY KEY,
    available INTEGER NOT NULL DEFAULT 1,
    times_booked INTEGER NOT NULL DEFAULT 0
)"#];

/// PostgreSQL variants of the same layout.
pub const CREATE_RESERVATIONS_POSTGRES: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS reservations (
    id TEXT PRIMARY KEY,
    request_id TEXT NOT NULL UNIQUE,
    user_id TEXT NOT NULL,
    room_id TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL,
    correlation_id TEXT NOT NULL,
    created_at TEXT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_reservations_user ON reservations(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_reservations_status_created ON reservations(status, created_at)",
];

pub const CREATE_ROOM_LOCKS_POSTGRES: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS room_locks (
    id TEXT PRIMARY KEY,
    request_id TEXT NOT NULL UNIQUE,
    room_id TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    correlation_id TEXT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_room_locks_probe ON room_locks(room_id, status, start_date, end_date)",
    "CREATE INDEX IF NOT EXISTS idx_room_locks_expiry ON room_locks(status, expires_at)",
];

pub const CREATE_ROOMS_POSTGRES: &[&str] = &[r#"
CREATE TABLE IF NOT EXISTS rooms (
    id TEXT PRIMARY KEY,
    available BOOLEAN NOT NULL DEFAULT TRUE,
    times_booked BIGINT NOT NULL DEFAULT 0
)"#];
