use async_trait::async_trait;
use game_types::ServerMessage;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::notifier::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub rooms: HashSet<String>,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let connection = Self {
            rooms: HashSet::new(),
            sender,
        };

        (connection, receiver)
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }
}

/// Live sockets and the rooms each one has joined
pub struct ConnectionManager {
    connections: RwLock<HashMap<String, Connection>>,
    room_members: RwLock<HashMap<String, HashSet<String>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            room_members: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(&self, id: &str) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new();

        {
            let mut connections = self.connections.write().await;
            connections.insert(id.to_string(), conn);
        }

        receiver
    }

    /// Forget a connection. Returns the rooms it had joined.
    pub async fn remove_connection(&self, id: &str) -> Vec<String> {
        let rooms: Vec<String> = {
            let mut connections = self.connections.write().await;
            connections
                .remove(id)
                .map(|conn| conn.rooms.into_iter().collect())
                .unwrap_or_default()
        };

        if !rooms.is_empty() {
            let mut room_members = self.room_members.write().await;
            for room_id in &rooms {
                if let Some(members) = room_members.get_mut(room_id) {
                    members.remove(id);
                    if members.is_empty() {
                        room_members.remove(room_id);
                    }
                }
            }
        }

        rooms
    }

    pub async fn send_to_connection(&self, id: &str, message: ServerMessage) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(id) {
            connection.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_room(&self, room_id: &str, message: ServerMessage) {
        let members: Vec<String> = {
            let room_members = self.room_members.read().await;
            match room_members.get(room_id) {
                Some(members) => members.iter().cloned().collect(),
                None => return,
            }
        };

        let connections = self.connections.read().await;
        for member in members {
            if let Some(connection) = connections.get(&member) {
                let _ = connection.send_message(message.clone());
            }
        }
    }

    pub async fn join_room(&self, room_id: &str, id: &str) {
        {
            let mut connections = self.connections.write().await;
            match connections.get_mut(id) {
                Some(connection) => {
                    connection.rooms.insert(room_id.to_string());
                }
                None => return,
            }
        }

        let mut room_members = self.room_members.write().await;
        room_members
            .entry(room_id.to_string())
            .or_default()
            .insert(id.to_string());
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    pub async fn room_member_count(&self, room_id: &str) -> usize {
        let room_members = self.room_members.read().await;
        room_members.get(room_id).map_or(0, HashSet::len)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for ConnectionManager {
    async fn subscribe(&self, room_id: &str, connection_id: &str) {
        self.join_room(room_id, connection_id).await;
    }

    async fn send_to(&self, connection_id: &str, message: ServerMessage) {
        if let Err(e) = self.send_to_connection(connection_id, message).await {
            tracing::debug!(connection_id, "Dropping message: {}", e);
        }
    }

    async fn broadcast(&self, room_id: &str, message: ServerMessage) {
        self.send_to_room(room_id, message).await;
    }
}
