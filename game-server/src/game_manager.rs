use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

use crate::error::{GameError, GameResult};
use crate::lobby::LobbyDirectory;
use crate::notifier::Notifier;
use crate::room_lock::RoomLocks;
use crate::turn_timer::{TurnExpiry, TurnTimerScheduler};
use game_core::{
    GameOutcome, GameRoom, JoinOutcome, RoomPhase, TurnAdvance, WordDictionary, random_letter,
    time_limit_for,
};
use game_persistence::RoomStore;
use game_types::{Rejection, ServerMessage, room_code};

const TIMEOUT_REASON: &str = "Time's up!";
const DISCONNECT_REASON: &str = "Disconnected";
const PAUSE_REASON: &str = "Game paused by a player";

/// Drives every room through its lifecycle.
///
/// Each operation takes the room lock, loads the room, applies one
/// transition to an in-memory copy and saves it once. Timers are only
/// touched and notifications only sent after that save succeeds.
pub struct GameManager {
    store: Arc<dyn RoomStore>,
    notifier: Arc<dyn Notifier>,
    lobbies: Arc<dyn LobbyDirectory>,
    dictionary: Arc<dyn WordDictionary>,
    locks: Arc<RoomLocks>,
    timers: TurnTimerScheduler,
}

impl GameManager {
    pub fn new(
        store: Arc<dyn RoomStore>,
        notifier: Arc<dyn Notifier>,
        lobbies: Arc<dyn LobbyDirectory>,
        dictionary: Arc<dyn WordDictionary>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|manager: &Weak<GameManager>| {
            let locks = Arc::new(RoomLocks::new());
            let expiry: Weak<dyn TurnExpiry> = manager.clone();
            let timers =
                TurnTimerScheduler::new(store.clone(), notifier.clone(), locks.clone(), expiry);

            Self {
                store,
                notifier,
                lobbies,
                dictionary,
                locks,
                timers,
            }
        })
    }

    pub fn timers(&self) -> &TurnTimerScheduler {
        &self.timers
    }

    /// Current stored state of a room
    pub async fn room(&self, room_id: &str) -> GameResult<Option<GameRoom>> {
        Ok(self.store.get(room_id).await?)
    }

    async fn load_room(&self, room_id: &str) -> GameResult<GameRoom> {
        self.store
            .get(room_id)
            .await?
            .ok_or_else(|| GameError::not_found(format!("Room {}", room_id)))
    }

    pub async fn join_room(
        &self,
        lobby_id: &str,
        user_id: &str,
        username: &str,
        connection_id: &str,
    ) -> GameResult<()> {
        let lobby = self
            .lobbies
            .fetch_lobby(lobby_id)
            .await?
            .ok_or_else(|| GameError::not_found(format!("Lobby {}", lobby_id)))?;
        if !lobby.is_joinable() {
            return Err(Rejection::LobbyNotJoinable.into());
        }

        let _guard = self.locks.lock(lobby_id).await;
        let mut room = self
            .store
            .get(lobby_id)
            .await?
            .unwrap_or_else(|| GameRoom::new(lobby_id.to_string(), Utc::now()));

        let outcome = room.join(user_id, connection_id, username, lobby.max_players)?;
        room.touch(Utc::now());
        self.store.save(&room).await?;

        info!(room_id = lobby_id, player_id = user_id, ?outcome, "Player joined room");

        self.notifier.subscribe(lobby_id, connection_id).await;
        let players = room.roster();
        self.notifier
            .send_to(
                connection_id,
                ServerMessage::RoomJoined {
                    room_id: room.id.clone(),
                    room_code: room_code(&room.id),
                    players: players.clone(),
                },
            )
            .await;

        let announcement = match outcome {
            JoinOutcome::Joined => ServerMessage::PlayerJoined {
                room_id: room.id.clone(),
                room_code: room_code(&room.id),
                players,
            },
            JoinOutcome::Reconnected => ServerMessage::PlayerStatusUpdate {
                room_id: room.id.clone(),
                players,
                disconnected_player: None,
            },
        };
        self.notifier.broadcast(lobby_id, announcement).await;

        Ok(())
    }

    pub async fn start_game(&self, lobby_id: &str, user_id: &str) -> GameResult<()> {
        if self.lobbies.fetch_lobby(lobby_id).await?.is_none() {
            return Err(GameError::not_found(format!("Lobby {}", lobby_id)));
        }

        let _guard = self.locks.lock(lobby_id).await;
        let mut room = self.load_room(lobby_id).await?;

        let letter = random_letter(&mut rand::rng());
        room.start(user_id, letter)?;
        room.touch(Utc::now());
        self.store.save(&room).await?;

        self.timers.start(lobby_id);
        info!(
            room_id = lobby_id,
            players = room.players.len(),
            "Game started"
        );

        self.notifier
            .broadcast(
                lobby_id,
                ServerMessage::GameStarted {
                    room_id: room.id.clone(),
                    room_code: room_code(&room.id),
                    current_rule: room.rule_description(),
                    time_left: room.time_limit.unwrap_or_else(|| time_limit_for(0)),
                    min_word_length: room.min_word_length() as u32,
                    rules_completed: room.rules_completed,
                    current_player: room.current_username(),
                    players: room.roster(),
                },
            )
            .await;

        Ok(())
    }

    pub async fn submit_word(&self, room_id: &str, user_id: &str, word: &str) -> GameResult<()> {
        let _guard = self.locks.lock(room_id).await;
        let mut room = self.load_room(room_id).await?;

        let word = room.check_submission(user_id, word, self.dictionary.as_ref())?;
        let next_letter = random_letter(&mut rand::rng());
        let accepted = room.accept_word(word, next_letter);
        let advance = room.advance_turn();
        room.touch(Utc::now());
        self.store.save(&room).await?;

        self.timers.cancel(room_id);
        if let TurnAdvance::Next { .. } = advance {
            self.timers.start(room_id);
        }

        info!(
            room_id,
            player_id = user_id,
            word = %accepted.word,
            points = accepted.points,
            "Word accepted"
        );

        let player = room
            .players
            .get(accepted.player_index)
            .map(|p| p.view())
            .ok_or_else(|| GameError::not_found(format!("Player {}", user_id)))?;
        self.notifier
            .broadcast(
                room_id,
                ServerMessage::WordSubmitted {
                    room_id: room.id.clone(),
                    room_code: room_code(&room.id),
                    word: accepted.word,
                    points: accepted.points,
                    player,
                    players: room.roster(),
                    current_rule: room.rule_description(),
                    rules_completed: room.rules_completed,
                    time_limit: room.time_limit.unwrap_or(0),
                    min_word_length: room.min_word_length() as u32,
                    current_player: room.current_username(),
                },
            )
            .await;

        if let TurnAdvance::GameOver(outcome) = advance {
            self.announce_game_over(&room, &outcome).await;
        }

        Ok(())
    }

    /// Stop the room's countdown. Turn and elimination state are untouched.
    pub async fn pause_game(&self, room_id: &str) -> GameResult<()> {
        let _guard = self.locks.lock(room_id).await;
        let room = self.load_room(room_id).await?;

        if room.phase() != RoomPhase::InProgress {
            return Err(Rejection::GameNotInProgress.into());
        }

        self.timers.cancel(room_id);
        info!(room_id, "Game paused");

        self.notifier
            .broadcast(
                room_id,
                ServerMessage::GamePaused {
                    room_id: room.id.clone(),
                    room_code: room_code(&room.id),
                    reason: PAUSE_REASON.to_string(),
                },
            )
            .await;

        Ok(())
    }

    /// Restart a paused countdown from the stored time limit. Host only.
    pub async fn resume_game(&self, room_id: &str, user_id: &str) -> GameResult<()> {
        let _guard = self.locks.lock(room_id).await;
        let room = self.load_room(room_id).await?;

        if room.phase() != RoomPhase::InProgress {
            return Err(Rejection::GameNotInProgress.into());
        }
        if !room.is_host(user_id) {
            return Err(Rejection::NotHost.into());
        }
        if self.timers.is_running(room_id) {
            return Err(Rejection::GameNotPaused.into());
        }

        self.timers.start(room_id);
        info!(room_id, "Game resumed");

        self.notifier
            .broadcast(
                room_id,
                ServerMessage::GameResumed {
                    room_id: room.id.clone(),
                    room_code: room_code(&room.id),
                    time_left: room
                        .time_limit
                        .unwrap_or_else(|| time_limit_for(room.rules_completed)),
                    current_player: room.current_username(),
                },
            )
            .await;

        Ok(())
    }

    /// The connection behind a player went away.
    pub async fn handle_disconnect(&self, room_id: &str, connection_id: &str) -> GameResult<()> {
        let _guard = self.locks.lock(room_id).await;
        let Some(mut room) = self.store.get(room_id).await? else {
            return Ok(());
        };

        let in_progress = room.phase() == RoomPhase::InProgress;
        let Some(disconnection) = room.disconnect(connection_id) else {
            return Ok(());
        };

        let mut outcome = None;
        let mut next_turn = false;
        if disconnection.held_turn {
            match room.advance_turn() {
                TurnAdvance::Next { .. } => next_turn = true,
                TurnAdvance::GameOver(result) => outcome = Some(result),
            }
        } else if in_progress && room.active_player_count() == 0 {
            outcome = Some(room.end_game());
        }
        room.touch(Utc::now());
        self.store.save(&room).await?;

        if disconnection.held_turn || outcome.is_some() {
            self.timers.cancel(room_id);
        }
        if next_turn {
            self.timers.start(room_id);
        }

        let username = room.players[disconnection.player_index].username.clone();
        info!(
            room_id,
            connection_id,
            eliminated = disconnection.eliminated,
            "Player disconnected"
        );

        self.notifier
            .broadcast(
                room_id,
                ServerMessage::PlayerStatusUpdate {
                    room_id: room.id.clone(),
                    players: room.roster(),
                    disconnected_player: Some(username.clone()),
                },
            )
            .await;

        if disconnection.eliminated {
            self.notifier
                .broadcast(
                    room_id,
                    ServerMessage::PlayerEliminated {
                        room_id: room.id.clone(),
                        username,
                        reason: DISCONNECT_REASON.to_string(),
                        players: room.roster(),
                    },
                )
                .await;
        }

        if let Some(outcome) = outcome {
            self.announce_game_over(&room, &outcome).await;
        }

        Ok(())
    }

    async fn expire_turn(&self, room_id: &str, player_id: &str) -> GameResult<()> {
        let _guard = self.locks.lock(room_id).await;
        let Some(mut room) = self.store.get(room_id).await? else {
            return Ok(());
        };

        let still_their_turn = room.phase() == RoomPhase::InProgress
            && room.current_player().is_some_and(|p| p.id == player_id)
            && !self.timers.is_running(room_id);
        if !still_their_turn {
            debug!(room_id, player_id, "Ignoring stale turn expiry");
            return Ok(());
        }

        let Some(index) = room.eliminate_current() else {
            return Ok(());
        };
        let advance = room.advance_turn();
        room.touch(Utc::now());
        self.store.save(&room).await?;

        if let TurnAdvance::Next { .. } = advance {
            self.timers.start(room_id);
        }

        let username = room.players[index].username.clone();
        info!(room_id, player_id, "Player eliminated by timeout");

        self.notifier
            .broadcast(
                room_id,
                ServerMessage::PlayerEliminated {
                    room_id: room.id.clone(),
                    username,
                    reason: TIMEOUT_REASON.to_string(),
                    players: room.roster(),
                },
            )
            .await;

        if let TurnAdvance::GameOver(outcome) = advance {
            self.announce_game_over(&room, &outcome).await;
        }

        Ok(())
    }

    async fn announce_game_over(&self, room: &GameRoom, outcome: &GameOutcome) {
        info!(
            room_id = %room.id,
            winners = outcome.winners.len(),
            reason = ?outcome.reason,
            "Game over"
        );

        self.notifier
            .broadcast(
                &room.id,
                ServerMessage::GameOver {
                    room_id: room.id.clone(),
                    winners: room.winner_views(outcome),
                    players: room.roster(),
                    reason: outcome.reason,
                    message: outcome.reason.describe().to_string(),
                },
            )
            .await;
    }

    /// Restart countdowns for games that were running before a restart.
    pub async fn recover_active_rooms(&self) -> GameResult<usize> {
        let mut recovered = 0;

        for room_id in self.store.list_room_ids().await? {
            let _guard = self.locks.lock(&room_id).await;
            match self.store.get(&room_id).await {
                Ok(Some(room)) if room.phase() == RoomPhase::InProgress => {
                    if !self.timers.is_running(&room_id) {
                        self.timers.start(&room_id);
                        recovered += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(room_id = %room_id, "Skipping room during recovery: {}", e),
            }
        }

        if recovered > 0 {
            info!("Recovered {} active rooms", recovered);
        }
        Ok(recovered)
    }

    /// Purge expired rooms and forget their locks
    pub async fn cleanup(&self) -> GameResult<u64> {
        let purged = self.store.purge_expired().await?;
        let pruned = self.locks.prune_idle();
        if purged > 0 || pruned > 0 {
            debug!(purged, pruned, "Room cleanup finished");
        }
        Ok(purged)
    }
}

#[async_trait]
impl TurnExpiry for GameManager {
    async fn turn_expired(&self, room_id: &str, player_id: &str) {
        if let Err(e) = self.expire_turn(room_id, player_id).await {
            error!(room_id, player_id, "Failed to handle turn timeout: {}", e);
        }
    }
}
