//! Expiration sweeper for stale holds.
//!
//! Periodically marks HELD locks past their `expires_at` as EXPIRED so
//! their interval becomes free. The sweeper is the correctness backstop
//! for saga compensation failures: if the booking side crashes between
//! hold and release, the interval is reclaimed after at most
//! `hold_ttl + sweep_interval`. Room counters are never touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::model::LockStatus;
use crate::storage::LockStore;

/// Expiration sweeper service.
pub struct ExpirationSweeper {
    locks: Arc<dyn LockStore>,
    sweep_interval: Duration,
}

impl ExpirationSweeper {
    /// Create a new sweeper.
    pub fn new(locks: Arc<dyn LockStore>, sweep_interval: Duration) -> Self {
        Self {
            locks,
            sweep_interval,
        }
    }

    /// Run the sweeper loop.
    ///
    /// This runs indefinitely, sweeping at the configured interval.
    pub async fn run(&self) {
        info!(
            sweep_interval = ?self.sweep_interval,
            "Starting expiration sweeper"
        );

        let mut ticker = interval(self.sweep_interval);

        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    /// One sweep pass. Returns the number of locks expired.
    pub async fn sweep_once(&self) -> usize {
        let now = Utc::now();

        let stale = match self.locks.find_expired_held(now).await {
            Ok(stale) => stale,
            Err(e) => {
                warn!(error = %e, "Failed to query expired holds");
                return 0;
            }
        };

        if stale.is_empty() {
            return 0;
        }

        info!(count = stale.len(), "Found expired holds");

        let mut expired = 0;
        for lock in stale {
            let request_id = lock.request_id.clone();
            let lock = match lock.expire(now) {
                Ok(lock) => lock,
                // Raced with a confirm/release between query and expire;
                // nothing to reclaim.
                Err(_) => continue,
            };

            match self.locks.transition(&lock, LockStatus::Held).await {
                Ok(true) => {
                    debug!(%request_id, room_id = %lock.room_id, "hold expired");
                    expired += 1;
                }
                Ok(false) => {
                    debug!(%request_id, "hold transitioned away before expiry write");
                }
                Err(e) => {
                    error!(%request_id, error = %e, "Failed to expire hold");
                }
            }
        }

        expired
    }
}
