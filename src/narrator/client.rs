//! Chat completions client (OpenAI-compatible, e.g. Perplexity)

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors talking to the completion service
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("completion API key not configured")]
    NotConfigured,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Status(StatusCode),

    #[error("no response from API")]
    EmptyResponse,

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Chat message for the completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Completion service client
#[derive(Debug)]
pub struct CompletionClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl CompletionClient {
    /// Create a client; `timeout` bounds each HTTP request
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, NarratorError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Check if API key is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a chat completion request and return the first choice's content
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, NarratorError> {
        let api_key = self.api_key.as_ref().ok_or(NarratorError::NotConfigured)?;

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature,
        };

        debug!("Sending chat request to completion API: {}", request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Completion API error: {} - {}", status, body);
            return Err(NarratorError::Status(status));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(NarratorError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_creation() {
        let system = ChatMessage::system("You are a talk show host");
        assert_eq!(system.role, "system");

        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "Hello");
    }

    #[test]
    fn test_client_not_configured() {
        let client =
            CompletionClient::new("http://localhost", None, "sonar", Duration::from_secs(1))
                .unwrap();
        assert!(!client.is_configured());

        let blank = CompletionClient::new(
            "http://localhost",
            Some("  ".to_string()),
            "sonar",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!blank.is_configured());
    }

    #[tokio::test]
    async fn test_chat_without_key_fails_fast() {
        let client =
            CompletionClient::new("http://localhost:1", None, "sonar", Duration::from_secs(1))
                .unwrap();
        let err = client
            .chat(vec![ChatMessage::user("hi")], 10, 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, NarratorError::NotConfigured));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "sonar",
            messages: vec![ChatMessage::user("hi")],
            max_tokens: 300,
            temperature: 0.5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "sonar");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 300);
    }
}
