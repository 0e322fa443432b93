//! WebSocket chat transport.
//!
//! A client connects to `/ws?player_id=<id>` and then exchanges
//! [`ClientMessage`]/[`ServerMessage`] JSON frames. Every chat line is handed
//! to the orchestrator; bot replies come back through the
//! [`ConnectionManager`], which is the orchestrator's messenger.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;
use zavalinka_domain::PlayerId;

use super::protocol::{ClientMessage, ServerMessage};
use crate::app::App;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub player_id: i64,
}

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(app): State<Arc<App>>,
) -> Response {
    let player_id = PlayerId::new(params.player_id);
    ws.on_upgrade(move |socket| handle_socket(socket, app, player_id))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, app: Arc<App>, player_id: PlayerId) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let connection_id = Uuid::new_v4();

    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);
    app.connections.register(player_id, connection_id, tx.clone());

    tracing::info!(
        player_id = %player_id,
        connection_id = %connection_id,
        "WebSocket connection established"
    );

    // Forward queued frames to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize server message");
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::Message { text }) => {
                    app.orchestrator.handle_message(player_id, &text).await;
                }
                Ok(ClientMessage::Heartbeat) => {
                    let _ = tx.try_send(ServerMessage::Pong);
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to parse message"
                    );
                    let error = ServerMessage::Error {
                        code: "PARSE_ERROR".to_string(),
                        message: format!("Invalid message format: {}", e),
                    };
                    if tx.try_send(error).is_err() {
                        tracing::warn!(
                            connection_id = %connection_id,
                            "Failed to send response, channel full or closed"
                        );
                    }
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    app.connections.unregister(player_id, connection_id);
    send_task.abort();

    tracing::info!(
        player_id = %player_id,
        connection_id = %connection_id,
        "WebSocket connection terminated"
    );
}
