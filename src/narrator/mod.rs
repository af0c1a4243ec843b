//! Narrative decoration in Brown's voice
//!
//! Provides:
//! - Dice narration via a chat completions service
//! - "Today's fortune" lines
//! - Local fallback lines whenever the service fails, times out or is throttled

mod client;
mod limiter;
pub mod lines;
mod persona;

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::NarratorConfig;
use crate::dice::SuccessTier;

pub use client::{ChatMessage, CompletionClient, NarratorError};
pub use limiter::RateLimiter;
pub use persona::PersonaData;

static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("valid regex"));

/// Outcome level as the narrator sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessLevel {
    CriticalSuccess,
    Success,
    Failure,
    CriticalFailure,
    /// Zero dice or zero-sided dice
    Impossible,
}

impl SuccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuccessLevel::CriticalSuccess => "critical_success",
            SuccessLevel::Success => "success",
            SuccessLevel::Failure => "failure",
            SuccessLevel::CriticalFailure => "critical_failure",
            SuccessLevel::Impossible => "impossible",
        }
    }
}

impl From<SuccessTier> for SuccessLevel {
    fn from(tier: SuccessTier) -> Self {
        match tier {
            SuccessTier::CriticalSuccess => SuccessLevel::CriticalSuccess,
            SuccessTier::Success => SuccessLevel::Success,
            SuccessTier::Failure => SuccessLevel::Failure,
            SuccessTier::CriticalFailure => SuccessLevel::CriticalFailure,
        }
    }
}

/// Payload describing a roll to narrate
#[derive(Debug, Clone, Serialize)]
pub struct NarrationRequest {
    pub total: i64,
    pub rolls: Vec<u32>,
    pub notation: String,
    pub success_level: SuccessLevel,
    pub username: String,
}

impl NarrationRequest {
    /// Degenerate payload for an impossible roll
    pub fn impossible(notation: &str, username: &str) -> Self {
        Self {
            total: 0,
            rolls: Vec::new(),
            notation: notation.to_string(),
            success_level: SuccessLevel::Impossible,
            username: username.to_string(),
        }
    }
}

/// Narrator: completion client plus persona, limits and fallbacks
#[derive(Debug)]
pub struct Narrator {
    client: CompletionClient,
    limiter: RateLimiter,
    persona: PersonaData,
    timeout: Duration,
    max_tokens: u32,
    temperature: f32,
    fortune_max_tokens: u32,
    fortune_temperature: f32,
}

impl Narrator {
    /// Create a narrator from configuration
    pub fn new(config: &NarratorConfig) -> Result<Self, NarratorError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = CompletionClient::new(
            &config.base_url,
            config.api_key.clone(),
            &config.model,
            timeout,
        )?;

        let persona = match &config.persona_path {
            Some(path) => PersonaData::load(path),
            None => PersonaData::builtin(),
        };

        if !client.is_configured() {
            warn!("No completion API key configured; narration will use fallback lines");
        }

        Ok(Self {
            client,
            limiter: RateLimiter::new(config.rate_limit_capacity, config.rate_limit_refill_per_sec),
            persona,
            timeout,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            fortune_max_tokens: config.fortune_max_tokens,
            fortune_temperature: config.fortune_temperature,
        })
    }

    /// Check if the completion service can be used at all
    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Run a completion call for `user_id` under the rate limit and timeout
    async fn call<F>(&self, user_id: &str, call: F) -> Result<String, NarratorError>
    where
        F: Future<Output = Result<String, NarratorError>>,
    {
        if !self.client.is_configured() {
            return Err(NarratorError::NotConfigured);
        }
        if !self.limiter.consume(user_id).await {
            return Err(NarratorError::RateLimited);
        }

        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(NarratorError::Timeout(self.timeout)))
    }

    /// Narrate a roll. Never fails: service errors yield a fallback line.
    pub async fn narrate(&self, user_id: &str, request: &NarrationRequest) -> String {
        let prompt = persona::dice_prompt(request);
        let call = self.client.chat(
            vec![ChatMessage::user(&prompt)],
            self.max_tokens,
            self.temperature,
        );

        match self.call(user_id, call).await {
            Ok(line) => line,
            Err(e) => {
                warn!(
                    "Narration for {} ({}) fell back: {}",
                    request.username,
                    request.success_level.as_str(),
                    e
                );
                fallback_line(request)
            }
        }
    }

    /// Today's fortune for `username`
    pub async fn fortune(&self, user_id: &str, username: &str) -> String {
        let samples = self.persona.pick_samples(&mut rand::rng());
        let (system, user) =
            persona::fortune_prompts(self.persona.persona_text(), &samples, username);
        let call = self.client.chat(
            vec![ChatMessage::system(&system), ChatMessage::user(&user)],
            self.fortune_max_tokens,
            self.fortune_temperature,
        );

        match self.call(user_id, call).await {
            Ok(text) => {
                info!("Fortune generated for {}", username);
                strip_citations(&text)
            }
            Err(e) => {
                warn!("Fortune for {} failed: {}", username, e);
                lines::fortune_unavailable(username)
            }
        }
    }
}

fn fallback_line(request: &NarrationRequest) -> String {
    lines::fallback(
        &mut rand::rng(),
        request.success_level,
        &request.username,
        request.total,
    )
}

/// Remove `[1]`-style citation markers the service tends to append
pub fn strip_citations(text: &str) -> String {
    CITATION_RE.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> Narrator {
        Narrator::new(&NarratorConfig::default()).unwrap()
    }

    #[test]
    fn test_strip_citations() {
        assert_eq!(strip_citations("[좋습니다!] 오늘은 대길![1][12]"), "[좋습니다!] 오늘은 대길!");
        assert_eq!(strip_citations("[호.]"), "[호.]");
    }

    #[test]
    fn test_level_from_tier() {
        assert_eq!(SuccessLevel::from(SuccessTier::Success), SuccessLevel::Success);
        assert_eq!(
            SuccessLevel::from(SuccessTier::CriticalFailure).as_str(),
            "critical_failure"
        );
    }

    #[test]
    fn test_impossible_payload() {
        let request = NarrationRequest::impossible("0d6", "노루");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["success_level"], "impossible");
        assert_eq!(json["total"], 0);
        assert_eq!(json["notation"], "0d6");
        assert_eq!(json["username"], "노루");
    }

    #[tokio::test]
    async fn test_unconfigured_narrate_falls_back() {
        let narrator = offline();
        assert!(!narrator.is_configured());

        let request = NarrationRequest {
            total: 7,
            rolls: vec![3, 4],
            notation: "2d6".to_string(),
            success_level: SuccessLevel::Failure,
            username: "오소리".to_string(),
        };
        let line = narrator.narrate("u1", &request).await;
        assert!(line.contains("7점"), "{}", line);
    }

    #[tokio::test]
    async fn test_unconfigured_fortune_falls_back() {
        let line = offline().fortune("u1", "오소리").await;
        assert_eq!(line, lines::fortune_unavailable("오소리"));
    }
}
