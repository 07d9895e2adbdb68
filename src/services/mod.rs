//! Business services: the lock engine, the reservation saga, and the
//! expiration sweeper.

pub mod lock_engine;
pub mod saga;
pub mod sweeper;

pub use lock_engine::{EngineError, HoldCommand, LockEngine};
pub use saga::{NewReservation, ReservationSaga, SagaError};
pub use sweeper::ExpirationSweeper;
