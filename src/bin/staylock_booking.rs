//! staylock-booking: Booking service
//!
//! Owns the reservation lifecycle. Accepts reservation intents and
//! drives each one through the hold → confirm saga against the hotel
//! service, compensating with a release on any failure.
//!
//! ## Configuration
//! - STAYLOCK_CONFIG: path to a YAML config file
//! - STAYLOCK__SERVER__BOOKING_PORT: listen port (default 8181)
//! - STAYLOCK__HOTEL__BASE_URL: hotel service address
//! - STAYLOCK__STORAGE__TYPE: sqlite (default) or postgres
//! - STAYLOCK_LOG: tracing filter (default "info")

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staylock::clients::HttpHotelClient;
use staylock::config::{Config, LOG_ENV_VAR};
use staylock::handlers::booking_rest;
use staylock::services::ReservationSaga;
use staylock::storage::init_reservation_store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(None).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting staylock-booking");
    info!("Hotel gateway: {}", config.hotel.base_url);

    let reservations = init_reservation_store(&config.storage).await?;
    let hotel = Arc::new(HttpHotelClient::new(config.hotel.clone())?);

    let saga = Arc::new(ReservationSaga::new(reservations, hotel));

    booking_rest::serve(saga, &config.server.host, config.server.booking_port)
        .await
        .map_err(|e| -> Box<dyn std::error::Error> { e.to_string().into() })?;

    Ok(())
}
