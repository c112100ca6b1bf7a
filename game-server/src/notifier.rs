use async_trait::async_trait;
use game_types::ServerMessage;

/// Outbound side of the transport.
///
/// The game logic only ever addresses connections and rooms through this
/// trait; delivery is best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Add a connection to a room's broadcast group
    async fn subscribe(&self, room_id: &str, connection_id: &str);

    async fn send_to(&self, connection_id: &str, message: ServerMessage);

    async fn broadcast(&self, room_id: &str, message: ServerMessage);
}
