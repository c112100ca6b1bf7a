use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameOverReason, PlayerView, WinnerView};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
#[ts(export)]
pub enum ClientMessage {
    JoinRoom {
        lobby_id: String,
        username: String,
        user_id: String,
    },
    StartGame {
        lobby_id: String,
        user_id: String,
    },
    SubmitWord {
        room_id: String,
        word: String,
        user_id: String,
    },
    PauseGame {
        room_id: String,
    },
    ResumeGame {
        room_id: String,
        user_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
#[ts(export)]
pub enum ServerMessage {
    RoomJoined {
        room_id: String,
        room_code: String,
        players: Vec<PlayerView>,
    },
    PlayerJoined {
        room_id: String,
        room_code: String,
        players: Vec<PlayerView>,
    },
    GameStarted {
        room_id: String,
        room_code: String,
        current_rule: String,
        time_left: u32,
        min_word_length: u32,
        rules_completed: u32,
        current_player: String,
        players: Vec<PlayerView>,
    },
    TimeUpdate {
        room_id: String,
        time_left: u32,
        current_player: String,
    },
    WordSubmitted {
        room_id: String,
        room_code: String,
        word: String,
        points: u32,
        player: PlayerView,
        players: Vec<PlayerView>,
        current_rule: String,
        rules_completed: u32,
        time_limit: u32,
        min_word_length: u32,
        current_player: String,
    },
    WordRejected {
        reason: String,
    },
    PlayerEliminated {
        room_id: String,
        username: String,
        reason: String,
        players: Vec<PlayerView>,
    },
    PlayerStatusUpdate {
        room_id: String,
        players: Vec<PlayerView>,
        disconnected_player: Option<String>,
    },
    GamePaused {
        room_id: String,
        room_code: String,
        reason: String,
    },
    GameResumed {
        room_id: String,
        room_code: String,
        time_left: u32,
        current_player: String,
    },
    GameOver {
        room_id: String,
        winners: Vec<WinnerView>,
        players: Vec<PlayerView>,
        reason: GameOverReason,
        message: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    /// Room the message belongs to, if it is room scoped
    pub fn room_id(&self) -> Option<&str> {
        match self {
            ServerMessage::RoomJoined { room_id, .. }
            | ServerMessage::PlayerJoined { room_id, .. }
            | ServerMessage::GameStarted { room_id, .. }
            | ServerMessage::TimeUpdate { room_id, .. }
            | ServerMessage::WordSubmitted { room_id, .. }
            | ServerMessage::PlayerEliminated { room_id, .. }
            | ServerMessage::PlayerStatusUpdate { room_id, .. }
            | ServerMessage::GamePaused { room_id, .. }
            | ServerMessage::GameResumed { room_id, .. }
            | ServerMessage::GameOver { room_id, .. } => Some(room_id),
            ServerMessage::WordRejected { .. } | ServerMessage::Error { .. } => None,
        }
    }
}
