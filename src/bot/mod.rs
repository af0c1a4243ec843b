//! Chat message handling
//!
//! A [`Bot`] is built once at startup and shared by every transport. Each
//! inbound message goes through [`Bot::handle`]: detection, parsing, rolling
//! and classification happen synchronously, then narration runs for every
//! token concurrently. Replies come back in token order.

pub mod detect;
pub mod format;

use std::sync::Arc;

use futures_util::future::join_all;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::BotConfig;
use crate::dice::{self, ParseOutcome, RollError, RollOutcome, RollRejection, RollSpec};
use crate::narrator::{lines, NarrationRequest, Narrator};

/// Failures while processing a single token
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Roll(#[from] RollError),
}

/// A chat message delivered by a transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub channel_id: String,
    pub author_id: String,
    pub display_name: String,
    pub content: String,
}

/// What a reply is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Roll,
    Rejection,
    Fortune,
    Malfunction,
}

/// A reply to post back into the channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub channel_id: String,
    /// Author id of the message being answered
    pub reply_to: String,
    pub kind: ReplyKind,
    pub text: String,
}

/// Work left after the synchronous stage, one per reply
#[derive(Debug)]
enum Pending {
    Roll { spec: RollSpec, outcome: RollOutcome },
    Impossible { notation: String },
    Fortune,
    Ready(ReplyKind, String),
}

/// The dice bot
#[derive(Debug)]
pub struct Bot {
    user_id: String,
    command_prefix: String,
    narrator: Arc<Narrator>,
}

impl Bot {
    pub fn new(config: &BotConfig, narrator: Arc<Narrator>) -> Self {
        Self {
            user_id: config.user_id.clone(),
            command_prefix: config.command_prefix.clone(),
            narrator,
        }
    }

    /// The bot's own author id
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    fn is_own(&self, message: &InboundMessage) -> bool {
        message.author_id == self.user_id
    }

    fn is_fortune(&self, content: &str) -> bool {
        content
            .trim()
            .strip_prefix(self.command_prefix.as_str())
            .is_some_and(|cmd| matches!(cmd, "fortune" | "운세"))
    }

    /// Whether `message` will get at least a typing indicator from the bot
    pub fn wants(&self, message: &InboundMessage) -> bool {
        !self.is_own(message)
            && (self.is_fortune(&message.content) || !detect::scan(&message.content).is_empty())
    }

    /// Handle a message using the thread-local random source
    pub async fn handle(&self, message: &InboundMessage) -> Vec<Reply> {
        let pending = self.prepare(message, &mut rand::rng());
        self.deliver(message, pending).await
    }

    /// Handle a message with an explicit random source
    pub async fn handle_with<R: Rng + ?Sized>(
        &self,
        message: &InboundMessage,
        rng: &mut R,
    ) -> Vec<Reply> {
        let pending = self.prepare(message, rng);
        self.deliver(message, pending).await
    }

    /// Synchronous stage: everything that needs randomness
    fn prepare<R: Rng + ?Sized>(&self, message: &InboundMessage, rng: &mut R) -> Vec<Pending> {
        if self.is_own(message) {
            return Vec::new();
        }

        if self.is_fortune(&message.content) {
            return vec![Pending::Fortune];
        }

        detect::scan(&message.content)
            .into_iter()
            .filter_map(|token| match self.prepare_token(token, &mut *rng) {
                Ok(pending) => pending,
                Err(e) => {
                    error!("Dice roll error for {:?}: {}", token, e);
                    Some(Pending::Ready(
                        ReplyKind::Malfunction,
                        format::malfunction_reply(&e),
                    ))
                }
            })
            .collect()
    }

    fn prepare_token<R: Rng + ?Sized>(
        &self,
        token: &str,
        rng: &mut R,
    ) -> Result<Option<Pending>, BotError> {
        let pending = match dice::parse(token) {
            ParseOutcome::NotRecognized => {
                debug!("Ignoring unrecognized token {:?}", token);
                return Ok(None);
            }
            ParseOutcome::Rejected(RollRejection::Impossible) => Pending::Impossible {
                notation: token.to_string(),
            },
            ParseOutcome::Rejected(RollRejection::TooManyDice { limit }) => {
                Pending::Ready(ReplyKind::Rejection, lines::too_many_dice(rng, limit))
            }
            ParseOutcome::Rejected(RollRejection::TooLargeSides { limit }) => {
                Pending::Ready(ReplyKind::Rejection, lines::too_large_sides(rng, limit))
            }
            ParseOutcome::Roll(spec) => {
                let outcome = spec.roll(rng)?;
                Pending::Roll { spec, outcome }
            }
        };

        Ok(Some(pending))
    }

    /// Asynchronous stage: narration and formatting
    async fn deliver(&self, message: &InboundMessage, pending: Vec<Pending>) -> Vec<Reply> {
        let replies = pending
            .into_iter()
            .map(|p| self.finish(message, p));

        join_all(replies).await
    }

    async fn finish(&self, message: &InboundMessage, pending: Pending) -> Reply {
        let (kind, text) = match pending {
            Pending::Roll { spec, outcome } => {
                let request = NarrationRequest {
                    total: outcome.total,
                    rolls: outcome.rolls.clone(),
                    notation: spec.notation.clone(),
                    success_level: outcome.tier.into(),
                    username: message.display_name.clone(),
                };
                let line = self.narrator.narrate(&message.author_id, &request).await;
                info!(
                    "{} rolled {} = {} ({})",
                    message.display_name, spec, outcome.total, outcome.tier
                );
                (
                    ReplyKind::Roll,
                    format::roll_reply(&message.display_name, &spec, &outcome, &line),
                )
            }
            Pending::Impossible { notation } => {
                let request = NarrationRequest::impossible(&notation, &message.display_name);
                let line = self.narrator.narrate(&message.author_id, &request).await;
                (ReplyKind::Rejection, format::impossible_reply(&line))
            }
            Pending::Fortune => {
                let text = self
                    .narrator
                    .fortune(&message.author_id, &message.display_name)
                    .await;
                (ReplyKind::Fortune, text)
            }
            Pending::Ready(kind, text) => (kind, text),
        };

        Reply {
            channel_id: message.channel_id.clone(),
            reply_to: message.author_id.clone(),
            kind,
            text,
        }
    }
}
