//! JSON frames exchanged with chat clients over the WebSocket.

use serde::{Deserialize, Serialize};

/// Frames a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A chat line for the bot
    Message { text: String },
    Heartbeat,
}

/// Frames the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A chat line from the bot
    Message { text: String },
    Pong,
    Error { code: String, message: String },
}
