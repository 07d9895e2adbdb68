//! Unified SQL ReservationStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of ReservationStore.
///
/// Works with any SQL database that implements the `SqlDatabase` trait
/// (PostgreSQL, SQLite).
pub struct SqlReservationStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlReservationStore<DB> {
    /// Create a new SQL reservation store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

/// Implement ReservationStore for a specific SQL backend.
macro_rules! impl_reservation_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlReservationStore<$db_type> {
            /// Initialize the database schema.
            pub async fn init(&self) -> crate::storage::Result<()> {
                for statement in <$db_type as SqlDatabase>::RESERVATIONS_DDL {
                    sqlx::query(statement).execute(&self.pool).await?;
                }
                Ok(())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::ReservationStore for SqlReservationStore<$db_type> {
            async fn insert(
                &self,
                reservation: &crate::model::Reservation,
            ) -> crate::storage::Result<()> {
                use sea_query::Query;

                use crate::storage::schema::Reservations;
                use crate::storage::StorageError;

                let stmt = Query::insert()
                    .into_table(Reservations::Table)
                    .columns([
                        Reservations::Id,
                        Reservations::RequestId,
                        Reservations::UserId,
                        Reservations::RoomId,
                        Reservations::StartDate,
                        Reservations::EndDate,
                        Reservations::Status,
                        Reservations::CorrelationId,
                        Reservations::CreatedAt,
                    ])
                    .values_panic([
                        reservation.id.to_string().into(),
                        reservation.request_id.clone().into(),
                        reservation.user_id.to_string().into(),
                        reservation.room_id.to_string().into(),
                        reservation.start_date.to_string().into(),
                        reservation.end_date.to_string().into(),
                        reservation.status.as_str().into(),
                        reservation.correlation_id.clone().into(),
                        super::encode_timestamp(reservation.created_at).into(),
                    ])
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                match sqlx::query(&sql).execute(&self.pool).await {
                    Ok(_) => Ok(()),
                    Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                        StorageError::DuplicateRequestId(reservation.request_id.clone()),
                    ),
                    Err(e) => Err(e.into()),
                }
            }

            async fn get_by_request_id(
                &self,
                request_id: &str,
            ) -> crate::storage::Result<Option<crate::model::Reservation>> {
                use sea_query::{Expr, Query};
                use sqlx::Row;

                use crate::model::{Reservation, ReservationStatus};
                use crate::storage::schema::Reservations;
                use crate::storage::StorageError;

                let stmt = Query::select()
                    .columns([
                        Reservations::Id,
                        Reservations::RequestId,
                        Reservations::UserId,
                        Reservations::RoomId,
                        Reservations::StartDate,
                        Reservations::EndDate,
                        Reservations::Status,
                        Reservations::CorrelationId,
                        Reservations::CreatedAt,
                    ])
                    .from(Reservations::Table)
                    .and_where(Expr::col(Reservations::RequestId).eq(request_id))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                let Some(row) = row else {
                    return Ok(None);
                };

                let status_raw: String = row.get("status");
                let status = ReservationStatus::parse(&status_raw).ok_or_else(|| {
                    StorageError::InvalidRow(format!("reservation status '{}'", status_raw))
                })?;

                Ok(Some(Reservation {
                    id: super::parse_uuid(&row.get::<String, _>("id"))?,
                    request_id: row.get("request_id"),
                    user_id: super::parse_uuid(&row.get::<String, _>("user_id"))?,
                    room_id: super::parse_uuid(&row.get::<String, _>("room_id"))?,
                    start_date: super::parse_date(&row.get::<String, _>("start_date"))?,
                    end_date: super::parse_date(&row.get::<String, _>("end_date"))?,
                    status,
                    correlation_id: row.get("correlation_id"),
                    created_at: super::parse_timestamp(&row.get::<String, _>("created_at"))?,
                }))
            }

            async fn transition_status(
                &self,
                request_id: &str,
                from: crate::model::ReservationStatus,
                to: crate::model::ReservationStatus,
            ) -> crate::storage::Result<bool> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::Reservations;

                let stmt = Query::update()
                    .table(Reservations::Table)
                    .values([(Reservations::Status, to.as_str().into())])
                    .and_where(Expr::col(Reservations::RequestId).eq(request_id))
                    .and_where(Expr::col(Reservations::Status).eq(from.as_str()))
                    .to_owned();

                let sql = <$db_type>::build_update(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;

                Ok(result.rows_affected() > 0)
            }
        }
    };
}

// Generate implementations for each SQL backend
#[cfg(feature = "postgres")]
impl_reservation_store!(super::postgres::Postgres, "postgres");
#[cfg(feature = "sqlite")]
impl_reservation_store!(super::sqlite::Sqlite, "sqlite");

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::model::{Reservation, ReservationStatus};
    use crate::storage::{ReservationStore, SqliteReservationStore, StorageError};

    fn d(s: &str) -> chrono::NaiveDate {
        s.parse().unwrap()
    }

    async fn store() -> SqliteReservationStore {
        // A pooled :memory: database is per-connection; pin the pool to
        // one connection so every query sees the same schema.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteReservationStore::new(pool);
        store.init().await.unwrap();
        store
    }

    fn reservation(request_id: &str) -> Reservation {
        Reservation::new_pending(
            request_id.to_string(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            d("2026-09-01"),
            d("2026-09-03"),
            "corr".to_string(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let store = store().await;
        let reservation = reservation("req-1");
        store.insert(&reservation).await.unwrap();

        let loaded = store.get_by_request_id("req-1").await.unwrap().unwrap();
        assert_eq!(loaded.id, reservation.id);
        assert_eq!(loaded.status, ReservationStatus::Pending);
        assert_eq!(loaded.start_date, reservation.start_date);
        assert_eq!(loaded.end_date, reservation.end_date);
    }

    #[tokio::test]
    async fn test_duplicate_request_id_rejected() {
        let store = store().await;
        store.insert(&reservation("req-1")).await.unwrap();

        let err = store.insert(&reservation("req-1")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateRequestId(_)));
    }

    #[tokio::test]
    async fn test_transition_status_is_conditional() {
        let store = store().await;
        store.insert(&reservation("req-1")).await.unwrap();

        let moved = store
            .transition_status("req-1", ReservationStatus::Pending, ReservationStatus::Confirmed)
            .await
            .unwrap();
        assert!(moved);

        // Terminal rows no longer match the PENDING precondition.
        let moved_again = store
            .transition_status("req-1", ReservationStatus::Pending, ReservationStatus::Cancelled)
            .await
            .unwrap();
        assert!(!moved_again);

        let loaded = store.get_by_request_id("req-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_get_unknown_request_id() {
        let store = store().await;
        assert!(store.get_by_request_id("missing").await.unwrap().is_none());
    }
}
