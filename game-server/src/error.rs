use game_persistence::StoreError;
use game_types::{Rejection, ServerMessage};
use thiserror::Error;

use crate::lobby::LobbyError;

const GENERIC_FAILURE: &str = "Something went wrong, please try again";

#[derive(Debug, Error)]
pub enum GameError {
    #[error("{0}")]
    Rejected(#[from] Rejection),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Lobby service error: {0}")]
    Lobby(#[from] LobbyError),
}

pub type GameResult<T> = Result<T, GameError>;

impl GameError {
    pub fn not_found(what: impl Into<String>) -> Self {
        GameError::NotFound(what.into())
    }

    /// Errors the acting player caused and can be told about as-is
    pub fn is_user_facing(&self) -> bool {
        matches!(self, GameError::Rejected(_) | GameError::NotFound(_))
    }

    /// Message sent back to the connection that triggered the error
    pub fn to_message(&self) -> ServerMessage {
        match self {
            GameError::Rejected(rejection) if rejection.is_word_rejection() => {
                ServerMessage::WordRejected {
                    reason: rejection.to_string(),
                }
            }
            error if error.is_user_facing() => ServerMessage::Error {
                message: error.to_string(),
            },
            _ => ServerMessage::Error {
                message: GENERIC_FAILURE.to_string(),
            },
        }
    }
}
