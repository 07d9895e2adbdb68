//! Server and networking configuration types.

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port for the booking REST surface.
    pub booking_port: u16,
    /// Port for the hotel lock REST surface.
    pub hotel_port: u16,
    /// Host to bind to.
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            booking_port: 8181,
            hotel_port: 8282,
            host: "0.0.0.0".to_string(),
        }
    }
}
