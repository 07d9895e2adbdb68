//! Mock ReservationStore implementation for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::{Reservation, ReservationStatus};
use crate::storage::{ReservationStore, Result, StorageError};

/// Mock reservation store that keeps rows in memory.
#[derive(Default)]
pub struct MockReservationStore {
    rows: RwLock<HashMap<String, Reservation>>,
    fail_on_insert: RwLock<bool>,
    fail_on_transition: RwLock<bool>,
}

impl MockReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_insert(&self, fail: bool) {
        *self.fail_on_insert.write().await = fail;
    }

    pub async fn set_fail_on_transition(&self, fail: bool) {
        *self.fail_on_transition.write().await = fail;
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ReservationStore for MockReservationStore {
    async fn insert(&self, reservation: &Reservation) -> Result<()> {
        if *self.fail_on_insert.read().await {
            return Err(StorageError::InvalidRow("injected insert failure".into()));
        }

        let mut rows = self.rows.write().await;
        if rows.contains_key(&reservation.request_id) {
            return Err(StorageError::DuplicateRequestId(
                reservation.request_id.clone(),
            ));
        }
        rows.insert(reservation.request_id.clone(), reservation.clone());
        Ok(())
    }

    async fn get_by_request_id(&self, request_id: &str) -> Result<Option<Reservation>> {
        Ok(self.rows.read().await.get(request_id).cloned())
    }

    async fn transition_status(
        &self,
        request_id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<bool> {
        if *self.fail_on_transition.read().await {
            return Err(StorageError::InvalidRow(
                "injected transition failure".into(),
            ));
        }

        let mut rows = self.rows.write().await;
        match rows.get_mut(request_id) {
            Some(row) if row.status == from => {
                row.status = to;
                Ok(true)
            }
            // Missing rows and stale preconditions both lose the CAS.
            _ => Ok(false),
        }
    }
}
