//! Clients for calls that leave the process.

pub mod hotel;
pub mod mock;

pub use hotel::{HotelClient, HotelClientError, HttpHotelClient, LockSnapshot};
pub use mock::MockHotelClient;
