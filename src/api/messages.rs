//! Webhook-style message endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::debug;

use super::AppState;
use crate::bot::{InboundMessage, Reply};

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub replies: Vec<Reply>,
}

/// Handle one inbound chat message and return the bot's replies
pub async fn post_message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> Json<MessagesResponse> {
    debug!(
        "Message from {} in {:?}",
        message.author_id, message.channel_id
    );

    let replies = state.bot.handle(&message).await;

    Json(MessagesResponse { replies })
}
