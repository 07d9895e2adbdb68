//! staylock-hotel: Hotel service
//!
//! Owns rooms and the inventory-level concurrency control. Serves the
//! lock surface (hold/confirm/release) and runs the expiration sweeper
//! that reclaims stale holds.
//!
//! ## Configuration
//! - STAYLOCK_CONFIG: path to a YAML config file
//! - STAYLOCK__SERVER__HOTEL_PORT: listen port (default 8282)
//! - STAYLOCK__STORAGE__TYPE: sqlite (default) or postgres
//! - STAYLOCK__LOCK__HOLD_TTL_MINUTES: hold lifetime (default 15)
//! - STAYLOCK_LOG: tracing filter (default "info")

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staylock::config::{Config, LOG_ENV_VAR};
use staylock::handlers::hotel_rest;
use staylock::services::{ExpirationSweeper, LockEngine};
use staylock::storage::init_hotel_stores;

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

    info!("Starting staylock-hotel");

    let (locks, rooms) = init_hotel_stores(&config.storage).await?;

    let engine = Arc::new(LockEngine::new(
        locks.clone(),
        rooms,
        config.lock.hold_ttl(),
    ));

    let sweeper = ExpirationSweeper::new(locks, config.lock.sweep_interval());
    tokio::spawn(async move { sweeper.run().await });

    hotel_rest::serve(engine, &config.server.host, config.server.hotel_port)
        .await
        .map_err(|e| -> Box<dyn std::error::Error> { e.to_string().into() })?;

    Ok(())
}
