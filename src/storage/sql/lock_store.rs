//! Unified SQL LockStore implementation.
//!
//! The conflict probe relies on dates being stored as ISO-8601 TEXT:
//! lexicographic comparison on the raw columns is calendar comparison,
//! so the half-open overlap condition renders as plain `<`/`>`.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of LockStore.
pub struct SqlLockStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlLockStore<DB> {
    /// Create a new SQL lock store with the given pool.
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

/// Implement LockStore for a specific SQL backend.
macro_rules! impl_lock_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlLockStore<$db_type> {
            /// Initialize the database schema.
            pub async fn init(&self) -> crate::storage::Result<()> {
                for statement in <$db_type as SqlDatabase>::ROOM_LOCKS_DDL {
                    sqlx::query(statement).execute(&self.pool).await?;
                }
                Ok(())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::LockStore for SqlLockStore<$db_type> {
            async fn insert(&self, lock: &crate::model::RoomLock) -> crate::storage::Result<()> {
                use sea_query::Query;

                use crate::storage::schema::RoomLocks;
                use crate::storage::StorageError;

                let stmt = Query::insert()
                    .into_table(RoomLocks::Table)
                    .columns([
                        RoomLocks::Id,
                        RoomLocks::RequestId,
                        RoomLocks::RoomId,
                        RoomLocks::StartDate,
                        RoomLocks::EndDate,
                        RoomLocks::Status,
                        RoomLocks::CreatedAt,
                        RoomLocks::UpdatedAt,
                        RoomLocks::ExpiresAt,
                        RoomLocks::CorrelationId,
                    ])
                    .values_panic([
                        lock.id.to_string().into(),
                        lock.request_id.clone().into(),
                        lock.room_id.to_string().into(),
                        lock.start_date.to_string().into(),
                        lock.end_date.to_string().into(),
                        lock.status.as_str().into(),
                        super::encode_timestamp(lock.created_at).into(),
                        super::encode_timestamp(lock.updated_at).into(),
                        super::encode_timestamp(lock.expires_at).into(),
                        lock.correlation_id.clone().into(),
                    ])
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                match sqlx::query(&sql).execute(&self.pool).await {
                    Ok(_) => Ok(()),
                    Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                        Err(StorageError::DuplicateRequestId(lock.request_id.clone()))
                    }
                    Err(e) => Err(e.into()),
                }
            }

            async fn get_by_request_id(
                &self,
                request_id: &str,
            ) -> crate::storage::Result<Option<crate::model::RoomLock>> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::RoomLocks;

                let stmt = Query::select()
                    .columns(all_lock_columns())
                    .from(RoomLocks::Table)
                    .and_where(Expr::col(RoomLocks::RequestId).eq(request_id))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                match row {
                    Some(row) => Ok(Some(parse_lock_row!(row))),
                    None => Ok(None),
                }
            }

            async fn find_active_overlapping(
                &self,
                room_id: uuid::Uuid,
                start_date: chrono::NaiveDate,
                end_date: chrono::NaiveDate,
            ) -> crate::storage::Result<Vec<crate::model::RoomLock>> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::RoomLocks;

                // Half-open overlap: existing.start < new.end AND
                // new.start < existing.end. Strict comparison keeps
                // touching boundaries conflict-free.
                let stmt = Query::select()
                    .columns(all_lock_columns())
                    .from(RoomLocks::Table)
                    .and_where(Expr::col(RoomLocks::RoomId).eq(room_id.to_string()))
                    .and_where(Expr::col(RoomLocks::Status).is_in(["HELD", "CONFIRMED"]))
                    .and_where(Expr::col(RoomLocks::StartDate).lt(end_date.to_string()))
                    .and_where(Expr::col(RoomLocks::EndDate).gt(start_date.to_string()))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

                let mut locks = Vec::with_capacity(rows.len());
                for row in rows {
                    locks.push(parse_lock_row!(row));
                }
                Ok(locks)
            }

            async fn transition(
                &self,
                lock: &crate::model::RoomLock,
                from: crate::model::LockStatus,
            ) -> crate::storage::Result<bool> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::RoomLocks;

                let stmt = Query::update()
                    .table(RoomLocks::Table)
                    .values([
                        (RoomLocks::Status, lock.status.as_str().into()),
                        (
                            RoomLocks::UpdatedAt,
                            super::encode_timestamp(lock.updated_at).into(),
                        ),
                    ])
                    .and_where(Expr::col(RoomLocks::RequestId).eq(lock.request_id.as_str()))
                    .and_where(Expr::col(RoomLocks::Status).eq(from.as_str()))
                    .to_owned();

                let sql = <$db_type>::build_update(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;

                Ok(result.rows_affected() > 0)
            }

            async fn find_expired_held(
                &self,
                now: chrono::DateTime<chrono::Utc>,
            ) -> crate::storage::Result<Vec<crate::model::RoomLock>> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::RoomLocks;

                let stmt = Query::select()
                    .columns(all_lock_columns())
                    .from(RoomLocks::Table)
                    .and_where(Expr::col(RoomLocks::Status).eq("HELD"))
                    .and_where(Expr::col(RoomLocks::ExpiresAt).lt(super::encode_timestamp(now)))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

                let mut locks = Vec::with_capacity(rows.len());
                for row in rows {
                    locks.push(parse_lock_row!(row));
                }
                Ok(locks)
            }
        }
    };
}

/// The full lock column list, in row-parse order.
fn all_lock_columns() -> [crate::storage::schema::RoomLocks; 10] {
    use crate::storage::schema::RoomLocks;
    [
        RoomLocks::Id,
        RoomLocks::RequestId,
        RoomLocks::RoomId,
        RoomLocks::StartDate,
        RoomLocks::EndDate,
        RoomLocks::Status,
        RoomLocks::CreatedAt,
        RoomLocks::UpdatedAt,
        RoomLocks::ExpiresAt,
        RoomLocks::CorrelationId,
    ]
}

/// Decode one `room_locks` row into a `RoomLock`.
macro_rules! parse_lock_row {
    ($row:expr) => {{
        use sqlx::Row;

        use crate::model::{LockStatus, RoomLock};
        use crate::storage::StorageError;

        let status_raw: String = $row.get("status");
        let status = LockStatus::parse(&status_raw)
            .ok_or_else(|| StorageError::InvalidRow(format!("lock status '{}'", status_raw)))?;

        RoomLock {
            id: super::parse_uuid(&$row.get::<String, _>("id"))?,
            request_id: $row.get("request_id"),
            room_id: super::parse_uuid(&$row.get::<String, _>("room_id"))?,
            start_date: super::parse_date(&$row.get::<String, _>("start_date"))?,
            end_date: super::parse_date(&$row.get::<String, _>("end_date"))?,
            status,
            created_at: super::parse_timestamp(&$row.get::<String, _>("created_at"))?,
            updated_at: super::parse_timestamp(&$row.get::<String, _>("updated_at"))?,
            expires_at: super::parse_timestamp(&$row.get::<String, _>("expires_at"))?,
            correlation_id: $row.get("correlation_id"),
        }
    }};
}

// Generate implementations for each SQL backend
#[cfg(feature = "postgres")]
impl_lock_store!(super::postgres::Postgres, "postgres");
#[cfg(feature = "sqlite")]
impl_lock_store!(super::sqlite::Sqlite, "sqlite");
