//! Staylock - distributed hotel-room reservation coordination.
//!
//! Two collaborating services share this crate: a Booking service that
//! drives a hold → confirm saga with compensating release, and a Hotel
//! service whose lock engine enforces mutual exclusion of overlapping
//! date ranges per room.

pub mod clients;
pub mod config;
pub mod handlers;
pub mod model;
pub mod services;
pub mod storage;
