//! Mock RoomStore implementation for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::Room;
use crate::storage::{Result, RoomStore, StorageError};

/// Mock room store that keeps the registry in memory.
#[derive(Default)]
pub struct MockRoomStore {
    rows: RwLock<HashMap<Uuid, Room>>,
}

impl MockRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an available room and return its id.
    pub async fn seed_available(&self) -> Uuid {
        let room = Room::new(Uuid::new_v4());
        let id = room.id;
        self.rows.write().await.insert(id, room);
        id
    }

    /// Seed a room taken out of service and return its id.
    pub async fn seed_unavailable(&self) -> Uuid {
        let mut room = Room::new(Uuid::new_v4());
        room.available = false;
        let id = room.id;
        self.rows.write().await.insert(id, room);
        id
    }
}

#[async_trait]
impl RoomStore for MockRoomStore {
    async fn get(&self, room_id: Uuid) -> Result<Option<Room>> {
        Ok(self.rows.read().await.get(&room_id).cloned())
    }

    async fn upsert(&self, room: &Room) -> Result<()> {
        self.rows.write().await.insert(room.id, room.clone());
        Ok(())
    }

    async fn increment_times_booked(&self, room_id: Uuid) -> Result<()> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&room_id) {
            Some(room) => {
                room.times_booked += 1;
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("room {}", room_id))),
        }
    }
}
