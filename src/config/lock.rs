//! Lock engine configuration (hotel side).

use serde::Deserialize;

/// Hold lifetime and sweeper cadence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Time from hold creation until `expires_at`, in minutes.
    pub hold_ttl_minutes: u64,
    /// Sweeper cadence, in seconds.
    pub sweep_interval_seconds: u64,
}

impl LockConfig {
    /// Hold TTL as a chrono duration (for `expires_at` arithmetic).
    pub fn hold_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.hold_ttl_minutes as i64)
    }

    /// Sweep cadence as a std duration (for the interval timer).
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            hold_ttl_minutes: 15,
            sweep_interval_seconds: 30,
        }
    }
}
