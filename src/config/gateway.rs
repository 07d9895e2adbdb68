//! Hotel gateway configuration (booking side).

use serde::Deserialize;

/// Where the booking service reaches the hotel lock surface, and how
/// patient it is about it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HotelGatewayConfig {
    /// Base URL of the hotel service.
    pub base_url: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retry count for retryable failures (transport, 408/429/5xx).
    pub max_retries: u32,
}

impl Default for HotelGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8282".to_string(),
            timeout_ms: 5000,
            max_retries: 3,
        }
    }
}
