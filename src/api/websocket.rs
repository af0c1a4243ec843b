//! WebSocket handler for chat transport connections
//!
//! A connection joins one or more channels, relays chat messages, and receives
//! every bot reply posted in the channels it has joined.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use super::AppState;
use crate::bot::{InboundMessage, Reply, ReplyKind};

/// Outbound queue depth per connection
const QUEUE_DEPTH: usize = 64;

/// How long a broadcast waits on one slow connection
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected transport session
#[derive(Debug)]
pub struct Session {
    pub connection_id: String,
    pub channels: HashSet<String>,
    pub sender: mpsc::Sender<ServerMessage>,
}

/// Connection manager for all active WebSocket connections
#[derive(Default)]
pub struct ConnectionManager {
    sessions: RwLock<HashMap<String, Session>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session
    pub async fn register(&self, session: Session) {
        let connection_id = session.connection_id.clone();
        self.sessions.write().await.insert(connection_id, session);
    }

    /// Remove a session
    pub async fn unregister(&self, connection_id: &str) {
        self.sessions.write().await.remove(connection_id);
    }

    /// Add a channel to a session's subscriptions
    pub async fn join(&self, connection_id: &str, channel_id: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(connection_id) {
            session.channels.insert(channel_id.to_string());
        }
    }

    /// Broadcast a message to every connection joined to a channel
    ///
    /// Sends run concurrently; a connection that stays full for
    /// [`SEND_TIMEOUT`] misses the message.
    pub async fn broadcast_channel(&self, channel_id: &str, msg: ServerMessage) {
        let sends = self
            .joined(channel_id)
            .await
            .into_iter()
            .map(|(connection_id, sender)| {
                let msg = msg.clone();
                async move {
                    if let Err(e) = sender.send_timeout(msg, SEND_TIMEOUT).await {
                        warn!("Failed to broadcast to connection {}: {}", connection_id, e);
                    }
                }
            });

        join_all(sends).await;
    }

    /// Best-effort notice to a channel; dropped for connections with a full queue
    pub async fn notify_channel(&self, channel_id: &str, msg: ServerMessage) {
        for (connection_id, sender) in self.joined(channel_id).await {
            match sender.try_send(msg.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("Connection {} queue full, dropping notice", connection_id);
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }

    async fn joined(&self, channel_id: &str) -> Vec<(String, mpsc::Sender<ServerMessage>)> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| s.channels.contains(channel_id))
            .map(|s| (s.connection_id.clone(), s.sender.clone()))
            .collect()
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome message on connect
    Welcome { connection_id: String },
    /// Channel subscription confirmed
    Joined { channel_id: String },
    /// The bot is working on a reply in this channel
    Typing { channel_id: String },
    /// A bot reply
    Reply {
        channel_id: String,
        reply_to: String,
        kind: ReplyKind,
        text: String,
        at: String,
    },
    /// Error message
    Error { message: String },
}

impl From<Reply> for ServerMessage {
    fn from(reply: Reply) -> Self {
        ServerMessage::Reply {
            channel_id: reply.channel_id,
            reply_to: reply.reply_to,
            kind: reply.kind,
            text: reply.text,
            at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a channel's replies
    Join { channel_id: String },
    /// A chat message seen in a channel
    Message(InboundMessage),
    /// Ping to keep connection alive
    Ping,
}

/// Handle WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
///
/// The queue is drained only by this loop, so the loop itself never waits on
/// it: direct responses go straight to the socket and channel traffic is sent
/// from spawned tasks.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(QUEUE_DEPTH);

    let connection_id = uuid::Uuid::new_v4().to_string();
    info!("WebSocket connected: {}", connection_id);

    state
        .connections
        .register(Session {
            connection_id: connection_id.clone(),
            channels: HashSet::new(),
            sender: tx,
        })
        .await;

    let welcome = ServerMessage::Welcome {
        connection_id: connection_id.clone(),
    };
    if send_frame(&mut socket, &welcome).await.is_err() {
        state.connections.unregister(&connection_id).await;
        return;
    }

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if send_frame(&mut socket, &msg).await.is_err() {
                    break;
                }
            }
            result = socket.recv() => {
                let response = match result {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handle_client_message(&state, &connection_id, client_msg).await
                            }
                            Err(e) => Some(ServerMessage::Error {
                                message: format!("invalid message: {}", e),
                            }),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => None,
                };

                if let Some(response) = response {
                    if send_frame(&mut socket, &response).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    state.connections.unregister(&connection_id).await;
    info!("WebSocket disconnected: {}", connection_id);
}

async fn send_frame(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!("Failed to serialize server message: {}", e);
            Ok(())
        }
    }
}

/// Handle a message from the client, returning a direct response if any
async fn handle_client_message(
    state: &AppState,
    connection_id: &str,
    msg: ClientMessage,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join { channel_id } => {
            state.connections.join(connection_id, &channel_id).await;
            Some(ServerMessage::Joined { channel_id })
        }
        ClientMessage::Message(message) => {
            if !state.bot.wants(&message) {
                return None;
            }

            debug!(
                "Connection {} relayed message from {}",
                connection_id, message.author_id
            );

            // Narration can take seconds; keep reading the socket meanwhile
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .connections
                    .notify_channel(
                        &message.channel_id,
                        ServerMessage::Typing {
                            channel_id: message.channel_id.clone(),
                        },
                    )
                    .await;

                for reply in state.bot.handle(&message).await {
                    let channel_id = reply.channel_id.clone();
                    state
                        .connections
                        .broadcast_channel(&channel_id, reply.into())
                        .await;
                }
            });
            None
        }
        ClientMessage::Ping => None,
    }
}
