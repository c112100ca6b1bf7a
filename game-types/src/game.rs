use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Roster entry as broadcast to every member of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PlayerView {
    pub id: String,
    pub username: String,
    pub score: u32,
    pub is_current_player: bool,
    pub inactive: bool,
    pub eliminated: bool,
    pub position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WinnerView {
    pub id: String,
    pub username: String,
    pub score: u32,
}

/// Why a game reached its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameOverReason {
    AllEliminated,
    LastPlayerStanding,
    HighestScore,
}

impl GameOverReason {
    pub fn describe(&self) -> &'static str {
        match self {
            GameOverReason::AllEliminated => "All players have been eliminated.",
            GameOverReason::LastPlayerStanding => "Last player standing wins!",
            GameOverReason::HighestScore => {
                "Game ended with multiple players - highest score wins"
            }
        }
    }
}

/// Short code shown to players, derived from the room identifier
pub fn room_code(room_id: &str) -> String {
    room_id.chars().take(6).collect::<String>().to_uppercase()
}
