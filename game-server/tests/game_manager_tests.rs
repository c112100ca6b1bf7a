
use game_core::{RoomPhase, Rule};
use game_persistence::{MemoryRoomStore, RoomStore};
use game_server::error::GameError;
use game_server::game_manager::GameManager;
use game_server::turn_timer::TurnExpiry;
use game_server::lobby::{LobbyInfo, StaticLobbyDirectory};
use game_types::{GameOverReason, Rejection, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::*;

fn assert_rejected<T: std::fmt::Debug>(result: Result<T, GameError>, expected: Rejection) {
    match result {
        Err(GameError::Rejected(rejection)) => assert_eq!(rejection, expected),
        other => panic!("Expected rejection {:?}, got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_first_join_creates_room() {
    let setup = TestSetup::new();

    setup.join("Alice").await;

    let room = setup.room().await;
    assert_eq!(room.phase(), RoomPhase::Lobby);
    assert_eq!(room.players.len(), 1);
    assert_eq!(room.players[0].connection_id, "conn-alice");

    let direct = setup.notifier.direct("conn-alice");
    assert!(matches!(direct[0], ServerMessage::RoomJoined { .. }));
    assert!(matches!(
        setup.last_broadcast(),
        Some(ServerMessage::PlayerJoined { .. })
    ));
    assert_eq!(
        setup.notifier.subscriptions(),
        vec![(LOBBY.to_string(), "conn-alice".to_string())]
    );
}

#[tokio::test]
async fn test_join_unknown_lobby_is_not_found() {
    let setup = TestSetup::new();

    let result = setup
        .game_manager
        .join_room("missing", "user-alice", "Alice", "conn-alice")
        .await;

    assert!(matches!(result, Err(GameError::NotFound(_))));
    assert!(setup.store.get("missing").await.unwrap().is_none());
    assert_eq!(setup.notifier.total(), 0);
}

#[tokio::test]
async fn test_join_closed_lobby_is_rejected() {
    let setup = TestSetup::new();
    setup.set_lobby(
        "closed",
        LobbyInfo {
            max_players: 4,
            status: Some("finished".to_string()),
        },
    );

    let result = setup
        .game_manager
        .join_room("closed", "user-alice", "Alice", "conn-alice")
        .await;

    assert_rejected(result, Rejection::LobbyNotJoinable);
}

#[tokio::test]
async fn test_join_full_room_is_rejected() {
    let setup = TestSetup::new();
    setup.set_lobby(LOBBY, LobbyInfo::new(2));
    setup.join("Alice").await;
    setup.join("Bob").await;

    let result = setup
        .game_manager
        .join_room(LOBBY, "user-carol", "Carol", "conn-carol")
        .await;

    assert_rejected(result, Rejection::RoomFull);
    assert_eq!(setup.room().await.players.len(), 2);
}

#[tokio::test]
async fn test_reconnect_keeps_progress() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob", "Carol"]).await;
    setup
        .game_manager
        .submit_word(LOBBY, &user_id("Alice"), "test")
        .await
        .unwrap();
    let score = setup.room().await.players[0].score;

    setup
        .game_manager
        .join_room(LOBBY, &user_id("Alice"), "Alice", "conn-alice-2")
        .await
        .unwrap();

    let room = setup.room().await;
    assert_eq!(room.players.len(), 3);
    assert_eq!(room.players[0].connection_id, "conn-alice-2");
    assert_eq!(room.players[0].score, score);
    assert_eq!(room.current_username(), "Bob");
    assert!(matches!(
        setup.last_broadcast(),
        Some(ServerMessage::PlayerStatusUpdate {
            disconnected_player: None,
            ..
        })
    ));
}

#[tokio::test]
async fn test_new_player_cannot_join_running_game() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;

    let result = setup
        .game_manager
        .join_room(LOBBY, "user-dave", "Dave", "conn-dave")
        .await;

    assert_rejected(result, Rejection::GameAlreadyStarted);
}

#[tokio::test]
async fn test_only_host_can_start() {
    let setup = TestSetup::new();
    setup.join("Alice").await;
    setup.join("Bob").await;

    let result = setup.game_manager.start_game(LOBBY, &user_id("Bob")).await;

    assert_rejected(result, Rejection::NotHost);
    assert_eq!(setup.room().await.phase(), RoomPhase::Lobby);
    assert!(!setup.timer_running());
}

#[tokio::test]
async fn test_start_game_announces_first_turn() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;

    let room = setup.room().await;
    assert_eq!(room.phase(), RoomPhase::InProgress);
    assert_eq!(room.current_rule, Some(Rule::MinLength { min_length: 4 }));
    assert!(setup.timer_running());

    match setup.last_broadcast() {
        Some(ServerMessage::GameStarted {
            current_rule,
            time_left,
            min_word_length,
            rules_completed,
            current_player,
            players,
            ..
        }) => {
            assert_eq!(current_rule, "Word must be at least 4 characters!");
            assert_eq!(time_left, 10);
            assert_eq!(min_word_length, 4);
            assert_eq!(rules_completed, 0);
            assert_eq!(current_player, "Alice");
            assert_eq!(players.len(), 2);
        }
        other => panic!("Expected GameStarted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_accepted_word_passes_turn() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob", "Carol"]).await;

    setup
        .game_manager
        .submit_word(LOBBY, &user_id("Alice"), "test")
        .await
        .unwrap();

    let room = setup.room().await;
    assert!(room.players[0].score > 0);
    assert_eq!(room.current_username(), "Bob");
    assert_eq!(room.rules_completed, 1);
    assert_eq!(room.time_limit, Some(10));
    assert!(room.used_words.contains("test"));
    assert!(setup.timer_running());

    match setup.last_broadcast() {
        Some(ServerMessage::WordSubmitted {
            word,
            points,
            player,
            current_player,
            rules_completed,
            ..
        }) => {
            assert_eq!(word, "test");
            assert_eq!(points, 4);
            assert_eq!(player.username, "Alice");
            assert_eq!(current_player, "Bob");
            assert_eq!(rules_completed, 1);
        }
        other => panic!("Expected WordSubmitted, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_rejected_words_leave_room_unchanged() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;
    let before = setup.room().await;
    setup.notifier.clear();

    assert_rejected(
        setup
            .game_manager
            .submit_word(LOBBY, &user_id("Bob"), "test")
            .await,
        Rejection::NotYourTurn,
    );
    assert_rejected(
        setup
            .game_manager
            .submit_word(LOBBY, &user_id("Alice"), "tes")
            .await,
        Rejection::WordTooShort { min_length: 4 },
    );
    assert_rejected(
        setup
            .game_manager
            .submit_word(LOBBY, &user_id("Alice"), "qwerty")
            .await,
        Rejection::InvalidWord,
    );

    let after = setup.room().await;
    assert_eq!(after.used_words, before.used_words);
    assert_eq!(after.players, before.players);
    assert_eq!(after.rules_completed, 0);
    assert!(setup.events().is_empty());
}

#[tokio::test]
async fn test_duplicate_word_is_rejected_case_insensitively() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;

    let mut room = setup.room().await;
    room.current_rule = Some(Rule::MinLength { min_length: 4 });
    room.used_words.insert("house".to_string());
    setup.store.save(&room).await.unwrap();

    assert_rejected(
        setup
            .game_manager
            .submit_word(LOBBY, &user_id("Alice"), "HOUSE")
            .await,
        Rejection::DuplicateWord,
    );
}

#[tokio::test]
async fn test_submit_to_missing_room_is_not_found() {
    let setup = TestSetup::new();

    let result = setup
        .game_manager
        .submit_word("nowhere", &user_id("Alice"), "test")
        .await;

    assert!(matches!(result, Err(GameError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_in_two_player_game_ends_it() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;

    tokio::time::sleep(Duration::from_secs(11)).await;

    let room = setup.room().await;
    assert_eq!(room.phase(), RoomPhase::Ended);
    assert!(room.players[0].eliminated);
    assert_eq!(room.players[0].position, Some(1));
    assert!(!room.players[1].eliminated);
    assert!(!setup.timer_running());

    let broadcasts = setup.notifier.broadcasts(LOBBY);
    let time_updates = broadcasts
        .iter()
        .filter(|m| matches!(m, ServerMessage::TimeUpdate { .. }))
        .count();
    // the opening announcement plus one per second
    assert_eq!(time_updates, 11);
    assert!(broadcasts.iter().any(|m| matches!(
        m,
        ServerMessage::PlayerEliminated { username, .. } if username == "Alice"
    )));

    match broadcasts.last() {
        Some(ServerMessage::GameOver {
            winners, reason, ..
        }) => {
            assert_eq!(winners.len(), 1);
            assert_eq!(winners[0].username, "Bob");
            assert_eq!(*reason, GameOverReason::LastPlayerStanding);
        }
        other => panic!("Expected GameOver, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_passes_turn_with_fresh_clock() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob", "Carol"]).await;

    tokio::time::sleep(Duration::from_millis(10_500)).await;

    let room = setup.room().await;
    assert_eq!(room.phase(), RoomPhase::InProgress);
    assert!(room.players[0].eliminated);
    assert_eq!(room.current_username(), "Bob");
    assert_eq!(room.time_limit, Some(10));
    assert!(setup.timer_running());
}

#[tokio::test(start_paused = true)]
async fn test_submission_resets_countdown() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;

    tokio::time::sleep(Duration::from_millis(7_500)).await;
    assert_eq!(setup.room().await.time_limit, Some(3));

    setup
        .game_manager
        .submit_word(LOBBY, &user_id("Alice"), "test")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(4_800)).await;

    let room = setup.room().await;
    assert_eq!(room.current_username(), "Bob");
    assert!(!room.players[0].eliminated);
    assert_eq!(room.time_limit, Some(6));
}

#[tokio::test(start_paused = true)]
async fn test_new_turn_announces_full_clock_immediately() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob", "Carol"]).await;

    tokio::time::sleep(Duration::from_millis(10_500)).await;

    let last_update = setup
        .notifier
        .broadcasts(LOBBY)
        .into_iter()
        .filter(|m| matches!(m, ServerMessage::TimeUpdate { .. }))
        .last();
    assert_eq!(
        last_update,
        Some(ServerMessage::TimeUpdate {
            room_id: LOBBY.to_string(),
            time_left: 10,
            current_player: "Bob".to_string(),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_still_eliminates_when_final_tick_is_not_saved() {
    let setup = TestSetup::with_store(Arc::new(ZeroClockFailingStore::default()));
    setup.started_game(&["Alice", "Bob"]).await;

    tokio::time::sleep(Duration::from_secs(60)).await;

    let room = setup.room().await;
    assert_eq!(room.phase(), RoomPhase::Ended);
    assert!(room.players[0].eliminated);
    assert!(!room.players[1].eliminated);
    assert!(!setup.timer_running());
    assert!(matches!(
        setup.last_broadcast(),
        Some(ServerMessage::GameOver { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_expiry_after_accepted_word_is_ignored() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob", "Carol"]).await;

    setup
        .game_manager
        .submit_word(LOBBY, &user_id("Alice"), "test")
        .await
        .unwrap();
    setup
        .game_manager
        .turn_expired(LOBBY, &user_id("Alice"))
        .await;

    let room = setup.room().await;
    assert!(room.players.iter().all(|p| !p.eliminated));
    assert_eq!(room.current_username(), "Bob");
    assert!(setup.timer_running());
    assert!(!setup
        .events()
        .iter()
        .any(|m| matches!(m, ServerMessage::PlayerEliminated { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_expiry_while_newer_countdown_runs_is_ignored() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;

    setup.game_manager.pause_game(LOBBY).await.unwrap();
    setup
        .game_manager
        .resume_game(LOBBY, &user_id("Alice"))
        .await
        .unwrap();
    setup
        .game_manager
        .turn_expired(LOBBY, &user_id("Alice"))
        .await;

    let room = setup.room().await;
    assert_eq!(room.phase(), RoomPhase::InProgress);
    assert!(!room.players[0].eliminated);
    assert_eq!(room.current_username(), "Alice");
    assert!(setup.timer_running());
}

#[tokio::test]
async fn test_disconnect_of_current_player_advances_turn() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob", "Carol"]).await;

    setup
        .game_manager
        .handle_disconnect(LOBBY, &connection_id("Alice"))
        .await
        .unwrap();

    let room = setup.room().await;
    assert!(room.players[0].inactive);
    assert!(room.players[0].eliminated);
    assert_eq!(room.players[0].position, Some(1));
    assert_eq!(room.current_username(), "Bob");
    assert!(setup.timer_running());

    let broadcasts = setup.events();
    assert!(broadcasts.iter().any(|m| matches!(
        m,
        ServerMessage::PlayerStatusUpdate { disconnected_player: Some(name), .. } if name == "Alice"
    )));
    assert!(matches!(
        broadcasts.last(),
        Some(ServerMessage::PlayerEliminated { .. })
    ));
}

#[tokio::test]
async fn test_disconnect_in_lobby_only_marks_inactive() {
    let setup = TestSetup::new();
    setup.join("Alice").await;
    setup.join("Bob").await;

    setup
        .game_manager
        .handle_disconnect(LOBBY, &connection_id("Bob"))
        .await
        .unwrap();

    let room = setup.room().await;
    assert!(room.players[1].inactive);
    assert!(!room.players[1].eliminated);
    assert_eq!(room.phase(), RoomPhase::Lobby);
}

#[tokio::test]
async fn test_everyone_leaving_ends_game_without_winner() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;

    setup
        .game_manager
        .handle_disconnect(LOBBY, &connection_id("Bob"))
        .await
        .unwrap();
    assert_eq!(setup.room().await.phase(), RoomPhase::InProgress);

    setup
        .game_manager
        .handle_disconnect(LOBBY, &connection_id("Alice"))
        .await
        .unwrap();

    let room = setup.room().await;
    assert_eq!(room.phase(), RoomPhase::Ended);
    assert!(!setup.timer_running());
    match setup.last_broadcast() {
        Some(ServerMessage::GameOver {
            winners, reason, ..
        }) => {
            assert!(winners.is_empty());
            assert_eq!(reason, GameOverReason::AllEliminated);
        }
        other => panic!("Expected GameOver, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_unknown_connection_is_ignored() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;
    setup.notifier.clear();

    setup
        .game_manager
        .handle_disconnect(LOBBY, "conn-stranger")
        .await
        .unwrap();
    setup
        .game_manager
        .handle_disconnect("other-room", "conn-alice")
        .await
        .unwrap();

    assert!(setup.events().is_empty());
    assert!(setup.notifier.direct("conn-alice").is_empty());
    assert!(setup.notifier.direct("conn-stranger").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume() {
    let setup = TestSetup::new();
    setup.started_game(&["Alice", "Bob"]).await;

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    setup.game_manager.pause_game(LOBBY).await.unwrap();
    assert!(!setup.timer_running());
    assert!(matches!(
        setup.last_broadcast(),
        Some(ServerMessage::GamePaused { .. })
    ));

    tokio::time::sleep(Duration::from_secs(30)).await;
    let room = setup.room().await;
    assert_eq!(room.time_limit, Some(8));
    assert_eq!(room.current_username(), "Alice");

    assert_rejected(
        setup.game_manager.resume_game(LOBBY, &user_id("Bob")).await,
        Rejection::NotHost,
    );

    setup
        .game_manager
        .resume_game(LOBBY, &user_id("Alice"))
        .await
        .unwrap();
    assert!(setup.timer_running());
    assert!(matches!(
        setup.last_broadcast(),
        Some(ServerMessage::GameResumed { time_left: 8, .. })
    ));

    assert_rejected(
        setup.game_manager.resume_game(LOBBY, &user_id("Alice")).await,
        Rejection::GameNotPaused,
    );

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(setup.room().await.time_limit, Some(7));
}

#[tokio::test]
async fn test_pause_outside_game_is_rejected() {
    let setup = TestSetup::new();
    setup.join("Alice").await;

    assert_rejected(
        setup.game_manager.pause_game(LOBBY).await,
        Rejection::GameNotInProgress,
    );
}

#[tokio::test(start_paused = true)]
async fn test_recover_restarts_running_games() {
    let store = Arc::new(MemoryRoomStore::new());

    let mut running = seeded_room("running", &["Alice", "Bob"]);
    running.start(&user_id("Alice"), 'e').unwrap();
    running.time_limit = Some(4);
    store.save(&running).await.unwrap();
    store
        .save(&seeded_room("waiting", &["Carol"]))
        .await
        .unwrap();

    let setup = TestSetup::with_store(store);
    let recovered = setup.game_manager.recover_active_rooms().await.unwrap();

    assert_eq!(recovered, 1);
    assert!(setup.game_manager.timers().is_running("running"));
    assert!(!setup.game_manager.timers().is_running("waiting"));

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let room = setup.store.get("running").await.unwrap().unwrap();
    assert_eq!(room.time_limit, Some(3));
}

#[tokio::test]
async fn test_failed_save_sends_nothing() {
    let notifier = Arc::new(RecordingNotifier::default());
    let game_manager = GameManager::new(
        Arc::new(FailingStore),
        notifier.clone(),
        Arc::new(StaticLobbyDirectory::new().with_lobby(LOBBY, 4)),
        Arc::new(create_test_validator()),
    );

    let result = game_manager
        .join_room(LOBBY, "user-alice", "Alice", "conn-alice")
        .await;

    match result {
        Err(error @ GameError::Store(_)) => assert!(!error.is_user_facing()),
        other => panic!("Expected store error, got {:?}", other),
    }
    assert_eq!(notifier.total(), 0);
    assert!(notifier.subscriptions().is_empty());
}

#[tokio::test]
async fn test_cleanup_purges_expired_rooms() {
    let store = Arc::new(MemoryRoomStore::with_retention(chrono::Duration::zero()));
    let setup = TestSetup::with_store(store);
    setup.join("Alice").await;

    let purged = setup.game_manager.cleanup().await.unwrap();

    assert_eq!(purged, 1);
    assert!(setup.store.get(LOBBY).await.unwrap().is_none());
}
