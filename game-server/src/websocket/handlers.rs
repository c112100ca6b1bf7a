use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::{GameError, GameResult};
use crate::game_manager::GameManager;
use crate::notifier::Notifier;
use crate::websocket::connection::ConnectionManager;
use game_types::ClientMessage;

/// Dispatches one connection's client messages to the game manager
#[derive(Clone)]
pub struct MessageHandler {
    connection_id: String,
    connection_manager: Arc<ConnectionManager>,
    game_manager: Arc<GameManager>,
}

impl MessageHandler {
    pub fn new(
        connection_id: String,
        connection_manager: Arc<ConnectionManager>,
        game_manager: Arc<GameManager>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            game_manager,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) {
        let result = match message {
            ClientMessage::JoinRoom {
                lobby_id,
                username,
                user_id,
            } => self.handle_join_room(&lobby_id, &user_id, &username).await,
            ClientMessage::StartGame { lobby_id, user_id } => {
                self.game_manager.start_game(&lobby_id, &user_id).await
            }
            ClientMessage::SubmitWord {
                room_id,
                word,
                user_id,
            } => {
                self.game_manager
                    .submit_word(&room_id, &user_id, &word)
                    .await
            }
            ClientMessage::PauseGame { room_id } => self.game_manager.pause_game(&room_id).await,
            ClientMessage::ResumeGame { room_id, user_id } => {
                self.game_manager.resume_game(&room_id, &user_id).await
            }
        };

        if let Err(e) = result {
            self.report(e).await;
        }
    }

    async fn handle_join_room(
        &self,
        lobby_id: &str,
        user_id: &str,
        username: &str,
    ) -> GameResult<()> {
        info!(
            "Connection {} joining lobby {} as {}",
            self.connection_id, lobby_id, username
        );
        self.game_manager
            .join_room(lobby_id, user_id, username, &self.connection_id)
            .await
    }

    /// Tell the acting connection what went wrong
    pub async fn report(&self, error: GameError) {
        if error.is_user_facing() {
            debug!(connection_id = %self.connection_id, "Action rejected: {}", error);
        } else {
            error!(connection_id = %self.connection_id, "Action failed: {}", error);
        }

        self.connection_manager
            .send_to(&self.connection_id, error.to_message())
            .await;
    }

    /// Leave every room the connection had joined
    pub async fn handle_disconnect(&self, rooms: Vec<String>) {
        for room_id in rooms {
            if let Err(e) = self
                .game_manager
                .handle_disconnect(&room_id, &self.connection_id)
                .await
            {
                error!(
                    "Failed to handle disconnect of {} from room {}: {}",
                    self.connection_id, room_id, e
                );
            }
        }
    }
}
