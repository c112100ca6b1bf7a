use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub lobby_service_url: String,
    pub words_file: String,
    pub room_retention_hours: i64,
    pub cleanup_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_value("PORT", env::var("PORT").ok(), 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://word_rush.db?mode=rwc".to_string()),
            lobby_service_url: env::var("LOBBY_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            words_file: env::var("WORDS_FILE")
                .unwrap_or_else(|_| "./shared/words.txt".to_string()),
            room_retention_hours: parse_value(
                "ROOM_RETENTION_HOURS",
                env::var("ROOM_RETENTION_HOURS").ok(),
                24,
            )?,
            cleanup_interval_seconds: parse_value(
                "CLEANUP_INTERVAL_SECONDS",
                env::var("CLEANUP_INTERVAL_SECONDS").ok(),
                60,
            )?,
        })
    }
}

fn parse_value<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, value)),
        None => Ok(default),
    }
}
