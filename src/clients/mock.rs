//! Scriptable mock of the hotel gateway for saga tests.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::hotel::{HotelClient, HotelClientError, LockSnapshot};
use crate::model::LockStatus;

/// Mock hotel client with per-operation scripted failures and call
/// counters. On success it fabricates a plausible lock snapshot.
#[derive(Default)]
pub struct MockHotelClient {
    hold_calls: AtomicU32,
    confirm_calls: AtomicU32,
    release_calls: AtomicU32,
    hold_error: Mutex<Option<HotelClientError>>,
    confirm_error: Mutex<Option<HotelClientError>>,
    release_error: Mutex<Option<HotelClientError>>,
}

impl MockHotelClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_hold_with(&self, error: HotelClientError) {
        *self.hold_error.lock().await = Some(error);
    }

    pub async fn fail_confirm_with(&self, error: HotelClientError) {
        *self.confirm_error.lock().await = Some(error);
    }

    pub async fn fail_release_with(&self, error: HotelClientError) {
        *self.release_error.lock().await = Some(error);
    }

    pub fn hold_count(&self) -> u32 {
        self.hold_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_count(&self) -> u32 {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> u32 {
        self.release_calls.load(Ordering::SeqCst)
    }

    fn snapshot(
        room_id: Uuid,
        request_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: LockStatus,
    ) -> LockSnapshot {
        LockSnapshot {
            id: Uuid::new_v4(),
            request_id: request_id.to_string(),
            room_id,
            start_date,
            end_date,
            status,
        }
    }
}

#[async_trait]
impl HotelClient for MockHotelClient {
    async fn hold(
        &self,
        room_id: Uuid,
        request_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        _correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError> {
        self.hold_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.hold_error.lock().await.clone() {
            return Err(error);
        }
        Ok(Self::snapshot(
            room_id,
            request_id,
            start_date,
            end_date,
            LockStatus::Held,
        ))
    }

    async fn confirm(
        &self,
        room_id: Uuid,
        request_id: &str,
        _correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.confirm_error.lock().await.clone() {
            return Err(error);
        }
        // Dates are advisory in the snapshot; the mock has no row to echo.
        let today = chrono::Utc::now().date_naive();
        Ok(Self::snapshot(
            room_id,
            request_id,
            today,
            today + chrono::Duration::days(1),
            LockStatus::Confirmed,
        ))
    }

    async fn release(
        &self,
        room_id: Uuid,
        request_id: &str,
        _correlation_id: &str,
    ) -> Result<LockSnapshot, HotelClientError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.release_error.lock().await.clone() {
            return Err(error);
        }
        let today = chrono::Utc::now().date_naive();
        Ok(Self::snapshot(
            room_id,
            request_id,
            today,
            today + chrono::Duration::days(1),
            LockStatus::Released,
        ))
    }
}
