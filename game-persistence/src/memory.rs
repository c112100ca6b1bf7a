use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use game_core::GameRoom;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::room_store::{RoomStore, StoreError, decode_room, encode_room, DEFAULT_RETENTION_HOURS};

struct StoredRoom {
    document: String,
    expires_at: DateTime<Utc>,
}

/// Process-local store. Rooms are kept in their encoded form so reads go
/// through the same codec as the database store.
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<String, StoredRoom>>,
    retention: Duration,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::with_retention(Duration::hours(DEFAULT_RETENTION_HOURS))
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            retention,
        }
    }
}

impl Default for MemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn get(&self, room_id: &str) -> Result<Option<GameRoom>, StoreError> {
        let rooms = self.rooms.read().await;
        match rooms.get(room_id) {
            Some(stored) if stored.expires_at > Utc::now() => {
                decode_room(room_id, &stored.document).map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn save(&self, room: &GameRoom) -> Result<(), StoreError> {
        let document = encode_room(room)?;
        let expires_at = Utc::now() + self.retention;
        self.rooms.write().await.insert(
            room.id.clone(),
            StoredRoom {
                document,
                expires_at,
            },
        );
        Ok(())
    }

    async fn list_room_ids(&self) -> Result<Vec<String>, StoreError> {
        let now = Utc::now();
        let rooms = self.rooms.read().await;
        Ok(rooms
            .iter()
            .filter(|(_, stored)| stored.expires_at > now)
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, stored| stored.expires_at > now);
        Ok((before - rooms.len()) as u64)
    }
}
