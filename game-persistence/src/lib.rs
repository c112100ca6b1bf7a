pub mod connection;
pub mod entities;
pub mod memory;
pub mod repositories;
pub mod room_store;

pub use memory::MemoryRoomStore;
pub use repositories::RoomRepository;
pub use room_store::{RoomStore, StoreError, decode_room, encode_room, DEFAULT_RETENTION_HOURS};
