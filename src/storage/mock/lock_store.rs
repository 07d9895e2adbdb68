//! Mock LockStore implementation for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{overlaps, LockStatus, RoomLock};
use crate::storage::{LockStore, Result, StorageError};

/// Mock lock store that keeps rows in memory.
#[derive(Default)]
pub struct MockLockStore {
    rows: RwLock<HashMap<String, RoomLock>>,
    fail_on_insert: RwLock<bool>,
}

impl MockLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_insert(&self, fail: bool) {
        *self.fail_on_insert.write().await = fail;
    }

    /// Directly seed a lock row, bypassing the engine.
    pub async fn seed(&self, lock: RoomLock) {
        self.rows
            .write()
            .await
            .insert(lock.request_id.clone(), lock);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl LockStore for MockLockStore {
    async fn insert(&self, lock: &RoomLock) -> Result<()> {
        if *self.fail_on_insert.read().await {
            return Err(StorageError::InvalidRow("injected insert failure".into()));
        }

        let mut rows = self.rows.write().await;
        if rows.contains_key(&lock.request_id) {
            return Err(StorageError::DuplicateRequestId(lock.request_id.clone()));
        }
        rows.insert(lock.request_id.clone(), lock.clone());
        Ok(())
    }

    async fn get_by_request_id(&self, request_id: &str) -> Result<Option<RoomLock>> {
        Ok(self.rows.read().await.get(request_id).cloned())
    }

    async fn find_active_overlapping(
        &self,
        room_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RoomLock>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|lock| {
                lock.room_id == room_id
                    && lock.status.is_active()
                    && overlaps(lock.start_date, lock.end_date, start_date, end_date)
            })
            .cloned()
            .collect())
    }

    async fn transition(&self, lock: &RoomLock, from: LockStatus) -> Result<bool> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&lock.request_id) {
            Some(row) if row.status == from => {
                *row = lock.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_expired_held(&self, now: DateTime<Utc>) -> Result<Vec<RoomLock>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|lock| lock.status == LockStatus::Held && lock.expires_at < now)
            .cloned()
            .collect())
    }
}
