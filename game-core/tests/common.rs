use chrono::Utc;
use game_core::{GameRoom, WordValidator};

/// Creates a test WordValidator with a known set of words
pub fn create_test_validator() -> WordValidator {
    let word_list = "test\ntests\napple\nbanana\nhello\nworld\nhouse\nmouse\ntrain\nplane\nwater\nstone\nbread\ncream\nquiz";
    WordValidator::from_word_list(word_list)
}

/// Creates a lobby room with the given players joined in order
pub fn create_room_with_players(names: &[&str]) -> GameRoom {
    let mut room = GameRoom::new(format!("room-{}", names.join("-")), Utc::now());
    for name in names {
        room.join(
            &player_id(name),
            &connection_id(name),
            name,
            names.len().max(2),
        )
        .expect("join should succeed in lobby");
    }
    room
}

/// Creates a room and starts the game as the host
pub fn create_started_room(names: &[&str]) -> GameRoom {
    let mut room = create_room_with_players(names);
    room.start(&player_id(names[0]), 'e')
        .expect("host should be able to start");
    room
}

pub fn player_id(name: &str) -> String {
    format!("test-player-{}", name.to_lowercase())
}

pub fn connection_id(name: &str) -> String {
    format!("conn-{}", name.to_lowercase())
}

/// Asserts the turn invariant for an in-progress room
pub fn assert_single_active_current(room: &GameRoom) {
    let current: Vec<_> = room.players.iter().filter(|p| p.is_current_player).collect();
    assert_eq!(current.len(), 1, "exactly one current player expected");
    assert!(!current[0].eliminated);
    assert!(!current[0].inactive);
}
