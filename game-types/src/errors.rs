use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// An action that is not allowed in the room's current state.
///
/// Rejections never mutate the room. They are reported only to the player
/// who attempted the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Rejection {
    NotYourTurn,
    WordTooShort { min_length: u32 },
    DuplicateWord,
    InvalidWord,
    RuleViolation { rule: String },
    RoomFull,
    NotHost,
    LobbyNotJoinable,
    GameNotInProgress,
    GameAlreadyStarted,
    NotEnoughPlayers,
    GameNotPaused,
}

impl Rejection {
    /// Rejections produced by word validation are sent as `WordRejected`
    /// rather than as a generic error.
    pub fn is_word_rejection(&self) -> bool {
        matches!(
            self,
            Rejection::WordTooShort { .. }
                | Rejection::DuplicateWord
                | Rejection::InvalidWord
                | Rejection::RuleViolation { .. }
        )
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotYourTurn => write!(f, "Not your turn"),
            Rejection::WordTooShort { min_length } => {
                write!(f, "Word must be at least {} letters long", min_length)
            }
            Rejection::DuplicateWord => write!(f, "This word was already used in this game"),
            Rejection::InvalidWord => write!(f, "Not a valid word"),
            Rejection::RuleViolation { rule } => {
                write!(f, "Word does not follow the rule: {}", rule)
            }
            Rejection::RoomFull => write!(f, "Lobby is full"),
            Rejection::NotHost => write!(f, "Only the host can do that"),
            Rejection::LobbyNotJoinable => write!(f, "Lobby is not joinable"),
            Rejection::GameNotInProgress => write!(f, "Game not in progress"),
            Rejection::GameAlreadyStarted => write!(f, "Game already started"),
            Rejection::NotEnoughPlayers => write!(f, "Not enough players to start the game"),
            Rejection::GameNotPaused => write!(f, "Game is not paused"),
        }
    }
}

impl std::error::Error for Rejection {}
