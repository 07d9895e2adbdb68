//! The slice of the room the lock engine needs.
//!
//! The engine never loads a room aggregate; it needs presence, the
//! availability flag, and the bookings counter, all keyed by id.

use uuid::Uuid;

/// Room registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: Uuid,
    /// Rooms taken out of service reject new holds.
    pub available: bool,
    /// At-least-once statistic, incremented on confirm. Not a safety
    /// invariant.
    pub times_booked: i64,
}

impl Room {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            available: true,
            times_booked: 0,
        }
    }
}
