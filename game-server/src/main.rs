use chrono::Duration as RetentionWindow;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use game_core::WordValidator;
use game_persistence::{RoomRepository, connection::connect_and_migrate};
use game_server::{
    config::Config, create_routes, game_manager::GameManager, lobby::HttpLobbyDirectory,
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Word Rush game server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let dictionary = match WordValidator::from_file(&config.words_file) {
        Ok(dictionary) => Arc::new(dictionary),
        Err(e) => {
            error!("Failed to load word list '{}': {:#}", config.words_file, e);
            error!("Set WORDS_FILE to a file with one word per line.");
            std::process::exit(1);
        }
    };

    // Initialize database connection and run migrations
    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };
    let store = Arc::new(RoomRepository::with_retention(
        db,
        RetentionWindow::hours(config.room_retention_hours),
    ));

    let connection_manager = Arc::new(ConnectionManager::new());
    let lobbies = Arc::new(HttpLobbyDirectory::new(config.lobby_service_url.clone()));
    let game_manager = GameManager::new(store, connection_manager.clone(), lobbies, dictionary);

    match game_manager.recover_active_rooms().await {
        Ok(count) => info!("Resumed countdowns for {} rooms", count),
        Err(e) => error!("Failed to recover active rooms: {}", e),
    }

    let routes = create_routes(connection_manager.clone(), game_manager.clone());

    // Start cleanup task
    let cleanup_game_manager = game_manager.clone();
    let cleanup_interval = Duration::from_secs(config.cleanup_interval_seconds.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            if let Err(e) = cleanup_game_manager.cleanup().await {
                error!("Room cleanup failed: {}", e);
            }
        }
    });

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };
    info!("Server starting on {}:{}", ip, config.port);

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
                .expect("Failed to install SIGINT handler");
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler");

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
