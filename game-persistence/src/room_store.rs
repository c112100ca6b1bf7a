use async_trait::async_trait;
use game_core::GameRoom;
use thiserror::Error;

/// Rooms untouched for this long are dropped by the store
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Room {room_id} could not be encoded or decoded: {source}")]
    Serialization {
        room_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Authoritative storage for room documents.
///
/// Every `save` refreshes the room's retention window. Expired rooms read as
/// absent even before `purge_expired` removes them.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn get(&self, room_id: &str) -> Result<Option<GameRoom>, StoreError>;

    async fn save(&self, room: &GameRoom) -> Result<(), StoreError>;

    /// Identifiers of every unexpired room
    async fn list_room_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Delete expired rooms, returning how many were removed
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

pub fn encode_room(room: &GameRoom) -> Result<String, StoreError> {
    serde_json::to_string(room).map_err(|source| StoreError::Serialization {
        room_id: room.id.clone(),
        source,
    })
}

pub fn decode_room(room_id: &str, document: &str) -> Result<GameRoom, StoreError> {
    serde_json::from_str(document).map_err(|source| StoreError::Serialization {
        room_id: room_id.to_string(),
        source,
    })
}
