//! Unified SQL RoomStore implementation.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of RoomStore.
pub struct SqlRoomStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlRoomStore<DB> {
    /// Create a new SQL room store with the given pool.
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

/// Implement RoomStore for a specific SQL backend.
macro_rules! impl_room_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlRoomStore<$db_type> {
            /// Initialize the database schema.
            pub async fn init(&self) -> crate::storage::Result<()> {
                for statement in <$db_type as SqlDatabase>::ROOMS_DDL {
                    sqlx::query(statement).execute(&self.pool).await?;
                }
                Ok(())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::RoomStore for SqlRoomStore<$db_type> {
            async fn get(
                &self,
                room_id: uuid::Uuid,
            ) -> crate::storage::Result<Option<crate::model::Room>> {
                use sea_query::{Expr, Query};
                use sqlx::Row;

                use crate::model::Room;
                use crate::storage::schema::Rooms;

                let stmt = Query::select()
                    .columns([Rooms::Id, Rooms::Available, Rooms::TimesBooked])
                    .from(Rooms::Table)
                    .and_where(Expr::col(Rooms::Id).eq(room_id.to_string()))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                match row {
                    Some(row) => Ok(Some(Room {
                        id: super::parse_uuid(&row.get::<String, _>("id"))?,
                        available: row.get("available"),
                        times_booked: row.get("times_booked"),
                    })),
                    None => Ok(None),
                }
            }

            async fn upsert(&self, room: &crate::model::Room) -> crate::storage::Result<()> {
                use sea_query::{OnConflict, Query};

                use crate::storage::schema::Rooms;

                let stmt = Query::insert()
                    .into_table(Rooms::Table)
                    .columns([Rooms::Id, Rooms::Available, Rooms::TimesBooked])
                    .values_panic([
                        room.id.to_string().into(),
                        room.available.into(),
                        room.times_booked.into(),
                    ])
                    .on_conflict(
                        OnConflict::column(Rooms::Id)
                            .update_columns([Rooms::Available, Rooms::TimesBooked])
                            .to_owned(),
                    )
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&self.pool).await?;

                Ok(())
            }

            async fn increment_times_booked(
                &self,
                room_id: uuid::Uuid,
            ) -> crate::storage::Result<()> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::Rooms;
                use crate::storage::StorageError;

                // Single-statement atomic increment; no read-modify-write.
                let stmt = Query::update()
                    .table(Rooms::Table)
                    .value(
                        Rooms::TimesBooked,
                        Expr::col(Rooms::TimesBooked).add(1),
                    )
                    .and_where(Expr::col(Rooms::Id).eq(room_id.to_string()))
                    .to_owned();

                let sql = <$db_type>::build_update(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;

                if result.rows_affected() == 0 {
                    return Err(StorageError::NotFound(format!("room {}", room_id)));
                }
                Ok(())
            }
        }
    };
}

// Generate implementations for each SQL backend
#[cfg(feature = "postgres")]
impl_room_store!(super::postgres::Postgres, "postgres");
#[cfg(feature = "sqlite")]
impl_room_store!(super::sqlite::Sqlite, "sqlite");
