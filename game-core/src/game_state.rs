use chrono::{DateTime, Utc};
use game_types::{GameOverReason, PlayerView, Rejection, WinnerView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::rules::{self, DEFAULT_MIN_WORD_LENGTH, Rule};
use crate::scoring::word_score;
use crate::time_limit::{BASE_TIME_LIMIT, time_limit_for};
use crate::word_validation::WordDictionary;

pub type RoomId = String;
pub type PlayerId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    #[serde(alias = "socketId")]
    pub connection_id: String,
    pub username: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub is_current_player: bool,
    /// Disconnected but still in the room
    #[serde(default)]
    pub inactive: bool,
    #[serde(default)]
    pub eliminated: bool,
    /// 1-based elimination rank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl Player {
    pub fn new(id: PlayerId, connection_id: String, username: String) -> Self {
        Self {
            id,
            connection_id,
            username,
            score: 0,
            is_current_player: false,
            inactive: false,
            eliminated: false,
            position: None,
        }
    }

    /// Still connected and still in contention
    pub fn is_active(&self) -> bool {
        !self.eliminated && !self.inactive
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id.clone(),
            username: self.username.clone(),
            score: self.score,
            is_current_player: self.is_current_player,
            inactive: self.inactive,
            eliminated: self.eliminated,
            position: self.position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Lobby,
    InProgress,
    Ended,
}

/// One room's complete state, persisted as a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRoom {
    pub id: RoomId,
    /// Join order doubles as turn order and is never re-sorted.
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub current_player_index: usize,
    #[serde(default = "Utc::now")]
    pub last_active: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rule: Option<Rule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rule_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_word_length: Option<usize>,
    #[serde(default)]
    pub used_words: BTreeSet<String>,
    /// Seconds left in the current turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub rules_completed: u32,
    #[serde(default)]
    pub ended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    Reconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedWord {
    pub word: String,
    pub points: u32,
    pub player_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome {
    /// Indices into `players`
    pub winners: Vec<usize>,
    pub reason: GameOverReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnAdvance {
    Next { player_index: usize },
    GameOver(GameOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnection {
    pub player_index: usize,
    /// Newly eliminated by this disconnect
    pub eliminated: bool,
    pub held_turn: bool,
}

impl GameRoom {
    pub fn new(id: RoomId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            players: Vec::new(),
            current_player_index: 0,
            last_active: now,
            created_at: now,
            current_rule: None,
            current_rule_index: None,
            min_word_length: None,
            used_words: BTreeSet::new(),
            time_limit: Some(BASE_TIME_LIMIT),
            rules_completed: 0,
            ended: false,
        }
    }

    pub fn phase(&self) -> RoomPhase {
        if self.ended {
            RoomPhase::Ended
        } else if self.current_rule.is_some() {
            RoomPhase::InProgress
        } else {
            RoomPhase::Lobby
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }

    pub fn min_word_length(&self) -> usize {
        self.min_word_length.unwrap_or(DEFAULT_MIN_WORD_LENGTH)
    }

    pub fn player_index(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.players.first().is_some_and(|p| p.id == player_id)
    }

    /// The player holding the turn, if a game is running
    pub fn current_player(&self) -> Option<&Player> {
        if self.phase() != RoomPhase::InProgress {
            return None;
        }
        self.players.iter().find(|p| p.is_current_player)
    }

    pub fn current_username(&self) -> String {
        self.current_player()
            .map(|p| p.username.clone())
            .unwrap_or_default()
    }

    pub fn rule_description(&self) -> String {
        self.current_rule
            .as_ref()
            .map(Rule::description)
            .unwrap_or_default()
    }

    pub fn active_player_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    pub fn roster(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    pub fn winner_views(&self, outcome: &GameOutcome) -> Vec<WinnerView> {
        outcome
            .winners
            .iter()
            .filter_map(|&index| self.players.get(index))
            .map(|p| WinnerView {
                id: p.id.clone(),
                username: p.username.clone(),
                score: p.score,
            })
            .collect()
    }

    /// Add a player, or treat a known player id as a reconnect.
    ///
    /// A reconnect only swaps the connection id and clears `inactive`; score,
    /// turn and elimination are untouched.
    pub fn join(
        &mut self,
        player_id: &str,
        connection_id: &str,
        username: &str,
        capacity: usize,
    ) -> Result<JoinOutcome, Rejection> {
        if let Some(index) = self.player_index(player_id) {
            let player = &mut self.players[index];
            player.connection_id = connection_id.to_string();
            player.inactive = false;
            return Ok(JoinOutcome::Reconnected);
        }

        if self.phase() != RoomPhase::Lobby {
            return Err(Rejection::GameAlreadyStarted);
        }
        if self.players.len() >= capacity {
            return Err(Rejection::RoomFull);
        }

        self.players.push(Player::new(
            player_id.to_string(),
            connection_id.to_string(),
            username.to_string(),
        ));
        Ok(JoinOutcome::Joined)
    }

    /// Reset the room into a fresh game. Only the host may start, and only
    /// from the lobby.
    pub fn start(&mut self, requester_id: &str, letter: char) -> Result<usize, Rejection> {
        if self.phase() != RoomPhase::Lobby {
            return Err(Rejection::GameAlreadyStarted);
        }
        if !self.is_host(requester_id) {
            return Err(Rejection::NotHost);
        }
        let first = self
            .players
            .iter()
            .position(|p| !p.inactive)
            .ok_or(Rejection::NotEnoughPlayers)?;

        let min_length = DEFAULT_MIN_WORD_LENGTH;
        self.min_word_length = Some(min_length);
        self.current_rule_index = Some(0);
        self.current_rule = Some(rules::rule_at(0, min_length, letter));
        self.used_words.clear();
        self.rules_completed = 0;
        self.time_limit = Some(time_limit_for(0));
        self.ended = false;

        for player in &mut self.players {
            player.score = 0;
            player.is_current_player = false;
            player.eliminated = false;
            player.position = None;
        }
        self.players[first].is_current_player = true;
        self.current_player_index = first;

        Ok(first)
    }

    /// Run the submission checks in order and return the lowercased word if
    /// it passes all of them. Never mutates the room.
    pub fn check_submission(
        &self,
        player_id: &str,
        word: &str,
        dictionary: &dyn WordDictionary,
    ) -> Result<String, Rejection> {
        if self.phase() != RoomPhase::InProgress {
            return Err(Rejection::GameNotInProgress);
        }
        let rule = self
            .current_rule
            .as_ref()
            .ok_or(Rejection::GameNotInProgress)?;
        match self.current_player() {
            Some(current) if current.id == player_id => {}
            _ => return Err(Rejection::NotYourTurn),
        }

        let min_length = self.min_word_length();
        if word.chars().count() < min_length {
            return Err(Rejection::WordTooShort {
                min_length: min_length as u32,
            });
        }

        let lowered = word.to_lowercase();
        if self.used_words.contains(&lowered) {
            return Err(Rejection::DuplicateWord);
        }
        if !dictionary.is_valid_word(word) {
            return Err(Rejection::InvalidWord);
        }
        if !rule.matches(&lowered) {
            return Err(Rejection::RuleViolation {
                rule: rule.description(),
            });
        }

        Ok(lowered)
    }

    /// Record a word that passed [`GameRoom::check_submission`], credit the
    /// current player and rotate to the next rule.
    pub fn accept_word(&mut self, word: String, next_letter: char) -> AcceptedWord {
        let player_index = self.current_player_index;
        let points = word_score(&word);

        if let Some(player) = self.players.get_mut(player_index) {
            player.score += points;
        }
        self.used_words.insert(word.clone());
        self.rules_completed += 1;

        let next_index = rules::next_rule_index(self.current_rule_index.unwrap_or(0));
        self.current_rule_index = Some(next_index);
        self.current_rule = Some(rules::rule_at(
            next_index,
            self.min_word_length(),
            next_letter,
        ));

        AcceptedWord {
            word,
            points,
            player_index,
        }
    }

    /// Hand the turn to the next active player after the current slot, or
    /// end the game when fewer than two active players are left.
    pub fn advance_turn(&mut self) -> TurnAdvance {
        if self.active_player_count() <= 1 {
            return TurnAdvance::GameOver(self.end_game());
        }

        let total = self.players.len();
        let next = (1..=total)
            .map(|offset| (self.current_player_index + offset) % total)
            .find(|&index| self.players[index].is_active());

        match next {
            Some(player_index) => {
                for player in &mut self.players {
                    player.is_current_player = false;
                }
                self.players[player_index].is_current_player = true;
                self.current_player_index = player_index;
                self.time_limit = Some(time_limit_for(self.rules_completed));
                TurnAdvance::Next { player_index }
            }
            None => TurnAdvance::GameOver(self.end_game()),
        }
    }

    /// Eliminate whoever holds the turn. Returns their index.
    pub fn eliminate_current(&mut self) -> Option<usize> {
        let index = self.players.iter().position(|p| p.is_current_player)?;
        self.eliminate(index);
        Some(index)
    }

    fn eliminate(&mut self, index: usize) {
        let position = self.next_elimination_position();
        let player = &mut self.players[index];
        if player.eliminated {
            return;
        }
        player.eliminated = true;
        player.is_current_player = false;
        player.position = Some(position);
    }

    fn next_elimination_position(&self) -> u32 {
        self.players.iter().filter(|p| p.eliminated).count() as u32 + 1
    }

    /// Mark the player on `connection_id` inactive. During a game this is an
    /// elimination.
    pub fn disconnect(&mut self, connection_id: &str) -> Option<Disconnection> {
        let player_index = self
            .players
            .iter()
            .position(|p| p.connection_id == connection_id)?;
        let in_progress = self.phase() == RoomPhase::InProgress;

        let held_turn = in_progress && self.players[player_index].is_current_player;
        let was_eliminated = self.players[player_index].eliminated;
        self.players[player_index].inactive = true;

        if in_progress {
            self.eliminate(player_index);
        }

        Some(Disconnection {
            player_index,
            eliminated: in_progress && !was_eliminated,
            held_turn,
        })
    }

    /// Winners by the current standings, without ending anything.
    pub fn standings(&self) -> GameOutcome {
        let survivors: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.eliminated)
            .map(|(index, _)| index)
            .collect();

        match survivors.len() {
            0 => GameOutcome {
                winners: Vec::new(),
                reason: GameOverReason::AllEliminated,
            },
            1 => GameOutcome {
                winners: survivors,
                reason: GameOverReason::LastPlayerStanding,
            },
            _ => {
                let best = survivors
                    .iter()
                    .map(|&index| self.players[index].score)
                    .max()
                    .unwrap_or(0);
                GameOutcome {
                    winners: survivors
                        .into_iter()
                        .filter(|&index| self.players[index].score == best)
                        .collect(),
                    reason: GameOverReason::HighestScore,
                }
            }
        }
    }

    /// Move the room to its terminal state and decide the winners.
    pub fn end_game(&mut self) -> GameOutcome {
        self.ended = true;
        for player in &mut self.players {
            player.is_current_player = false;
        }
        self.standings()
    }
}
