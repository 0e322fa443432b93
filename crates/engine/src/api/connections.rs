//! Connection management for WebSocket clients.
//!
//! Tracks which connection currently speaks for which player and delivers
//! bot messages to it. A player has at most one live connection; a newer one
//! replaces the older.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;
use zavalinka_domain::PlayerId;

use super::protocol::ServerMessage;
use crate::infrastructure::ports::{MessagingError, MessengerPort};

#[derive(Debug, Clone)]
struct Connection {
    connection_id: Uuid,
    sender: mpsc::Sender<ServerMessage>,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    connections: DashMap<PlayerId, Connection>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a connection for `player_id`, replacing any previous one.
    pub fn register(
        &self,
        player_id: PlayerId,
        connection_id: Uuid,
        sender: mpsc::Sender<ServerMessage>,
    ) {
        let previous = self.connections.insert(
            player_id,
            Connection {
                connection_id,
                sender,
            },
        );
        if let Some(previous) = previous {
            tracing::info!(
                player_id = %player_id,
                old_connection_id = %previous.connection_id,
                connection_id = %connection_id,
                "Connection replaced"
            );
        } else {
            tracing::debug!(player_id = %player_id, connection_id = %connection_id, "Connection registered");
        }
    }

    /// Unregister a connection, unless a newer one has already replaced it.
    pub fn unregister(&self, player_id: PlayerId, connection_id: Uuid) {
        let removed = self
            .connections
            .remove_if(&player_id, |_, conn| conn.connection_id == connection_id);
        if removed.is_some() {
            tracing::debug!(player_id = %player_id, connection_id = %connection_id, "Connection unregistered");
        }
    }

    pub fn is_connected(&self, player_id: PlayerId) -> bool {
        self.connections.contains_key(&player_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessengerPort for ConnectionManager {
    async fn send_to(&self, recipient: PlayerId, text: &str) -> Result<(), MessagingError> {
        // Clone the sender so no map guard is held across the await
        let sender = self
            .connections
            .get(&recipient)
            .map(|conn| conn.sender.clone())
            .ok_or_else(|| MessagingError::RecipientUnavailable(recipient.to_string()))?;

        sender
            .send(ServerMessage::Message {
                text: text.to_string(),
            })
            .await
            .map_err(|_| MessagingError::ChannelClosed(recipient.to_string()))
    }
}
