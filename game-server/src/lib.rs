use std::sync::Arc;
use warp::Filter;

use crate::game_manager::GameManager;
use crate::websocket::ConnectionManager;

pub mod config;
pub mod error;
pub mod game_manager;
pub mod lobby;
pub mod notifier;
pub mod room_lock;
pub mod turn_timer;
pub mod websocket;

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    game_manager: Arc<GameManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let game_manager_filter = warp::any().map({
        let game_manager = game_manager.clone();
        move || game_manager.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(game_manager_filter)
        .map(|ws: warp::ws::Ws, conn_mgr, game_mgr| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, game_mgr))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .with(cors)
        .with(warp::log("word_rush"))
}
