use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use thiserror::Error;

/// What the lobby service knows about a lobby
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyInfo {
    pub max_players: usize,
    #[serde(default)]
    pub status: Option<String>,
}

impl LobbyInfo {
    pub fn new(max_players: usize) -> Self {
        Self {
            max_players,
            status: None,
        }
    }

    pub fn is_joinable(&self) -> bool {
        matches!(self.status.as_deref(), None | Some("pending") | Some("active"))
    }
}

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[async_trait]
pub trait LobbyDirectory: Send + Sync {
    /// `None` when the lobby does not exist
    async fn fetch_lobby(&self, lobby_id: &str) -> Result<Option<LobbyInfo>, LobbyError>;
}

#[derive(Deserialize)]
struct LobbyEnvelope {
    data: Option<LobbyInfo>,
}

/// Looks lobbies up through the lobby service's REST API
pub struct HttpLobbyDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLobbyDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LobbyDirectory for HttpLobbyDirectory {
    async fn fetch_lobby(&self, lobby_id: &str) -> Result<Option<LobbyInfo>, LobbyError> {
        let url = format!("{}/api/lobbies/{}", self.base_url, lobby_id);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            tracing::debug!(lobby_id, status = %response.status(), "Lobby lookup failed");
            return Ok(None);
        }

        let envelope: LobbyEnvelope = response.json().await?;
        Ok(envelope.data)
    }
}

/// Fixed set of lobbies, for tests and running without a lobby service
#[derive(Default)]
pub struct StaticLobbyDirectory {
    lobbies: DashMap<String, LobbyInfo>,
}

impl StaticLobbyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lobby(self, lobby_id: &str, max_players: usize) -> Self {
        self.insert(lobby_id, LobbyInfo::new(max_players));
        self
    }

    pub fn insert(&self, lobby_id: &str, info: LobbyInfo) {
        self.lobbies.insert(lobby_id.to_string(), info);
    }
}

#[async_trait]
impl LobbyDirectory for StaticLobbyDirectory {
    async fn fetch_lobby(&self, lobby_id: &str) -> Result<Option<LobbyInfo>, LobbyError> {
        Ok(self.lobbies.get(lobby_id).map(|entry| entry.value().clone()))
    }
}
