//! Common test utilities - DicedTest harness and a mock completion service

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use diced::config::NarratorConfig;
use diced::{Config, Server};
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Find a free local port
fn free_addr() -> Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Test harness that spawns a real diced server on a random port
pub struct DicedTest {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl DicedTest {
    /// Start a server whose narrator has no API key
    pub async fn start() -> Result<Self> {
        Self::start_with(Config::default()).await
    }

    /// Start a server with the given config (bind address is replaced)
    pub async fn start_with(mut config: Config) -> Result<Self> {
        let addr = free_addr()?;
        config.bind_addr = addr;

        let server = Arc::new(Server::new(config)?);
        let server_clone = server.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Post a chat message and return the `replies` array
    pub async fn say(&self, author: &str, content: &str) -> Result<Vec<serde_json::Value>> {
        let body = serde_json::json!({
            "channel_id": "studio",
            "author_id": author,
            "display_name": author,
            "content": content,
        });
        let resp = self.post("/messages", &body).await?;
        let json: serde_json::Value = resp.json().await?;
        Ok(json["replies"].as_array().cloned().unwrap_or_default())
    }

    /// Get the WebSocket URL for the server
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Connect to the WebSocket endpoint and consume the welcome message
    pub async fn connect_ws(&self) -> Result<WsClient> {
        let (ws_stream, _) = connect_async(self.ws_url().as_str()).await?;
        let (write, read) = ws_stream.split();
        let mut client = WsClient { write, read };

        let welcome = client.recv_json_timeout(Duration::from_secs(2)).await?;
        anyhow::ensure!(welcome["type"] == "welcome", "expected welcome, got {}", welcome);
        Ok(client)
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

impl Drop for DicedTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}

/// WebSocket client for testing
pub struct WsClient {
    write: futures_util::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        Message,
    >,
    read: futures_util::stream::SplitStream<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    >,
}

impl WsClient {
    async fn send_json(&mut self, msg: serde_json::Value) -> Result<()> {
        self.write
            .send(Message::Text(msg.to_string().into()))
            .await?;
        Ok(())
    }

    /// Join a channel and wait for the confirmation
    pub async fn join(&mut self, channel_id: &str) -> Result<()> {
        self.send_json(serde_json::json!({
            "type": "join",
            "channel_id": channel_id
        }))
        .await?;

        let joined = self.recv_json_timeout(Duration::from_secs(2)).await?;
        anyhow::ensure!(joined["type"] == "joined", "expected joined, got {}", joined);
        Ok(())
    }

    /// Relay a chat message
    pub async fn send_message(
        &mut self,
        channel_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<()> {
        self.send_json(serde_json::json!({
            "type": "message",
            "channel_id": channel_id,
            "author_id": author_id,
            "display_name": author_id,
            "content": content
        }))
        .await
    }

    /// Send a raw text frame
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.write.send(Message::Text(text.to_string().into())).await?;
        Ok(())
    }

    /// Receive the next message as JSON
    pub async fn recv_json(&mut self) -> Result<serde_json::Value> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Close(_))) | None => {
                    anyhow::bail!("WebSocket closed");
                }
                _ => continue, // Skip binary/ping/pong frames
            }
        }
    }

    /// Receive with timeout
    pub async fn recv_json_timeout(&mut self, timeout: Duration) -> Result<serde_json::Value> {
        match tokio::time::timeout(timeout, self.recv_json()).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!("Timeout waiting for WebSocket message"),
        }
    }

    /// Receive messages until one of `msg_type` arrives
    pub async fn expect(&mut self, msg_type: &str) -> Result<serde_json::Value> {
        loop {
            let msg = self.recv_json_timeout(Duration::from_secs(5)).await?;
            if msg["type"] == msg_type {
                return Ok(msg);
            }
        }
    }
}

/// How the mock completion service answers
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// 200 with this content as the first choice
    Reply(String),
    /// Respond with this status and an error body
    Status(u16),
    /// Wait before replying with the content
    Slow(Duration, String),
    /// 200 with an empty choices list
    NoChoices,
}

#[derive(Clone)]
struct MockState {
    behavior: MockBehavior,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

/// A local OpenAI-compatible completion service
pub struct MockCompletion {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
    _handle: JoinHandle<()>,
}

impl MockCompletion {
    pub async fn start(behavior: MockBehavior) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = MockState {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
            auth: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = state.requests.clone();
        let auth = state.auth.clone();

        let app = Router::new()
            .route("/chat/completions", post(completions))
            .with_state(state);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            requests,
            auth,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Narrator settings pointing at this mock
    pub fn narrator_config(&self) -> NarratorConfig {
        NarratorConfig {
            base_url: self.base_url(),
            api_key: Some("test-key".to_string()),
            timeout_secs: 1,
            ..NarratorConfig::default()
        }
    }

    /// Request bodies received so far
    pub async fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().await.clone()
    }

    /// Authorization headers received so far
    pub async fn auth_headers(&self) -> Vec<String> {
        self.auth.lock().await.clone()
    }
}

async fn completions(
    State(state): State<MockState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.requests.lock().await.push(body);
    if let Some(value) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        state.auth.lock().await.push(value.to_string());
    }

    let reply = |content: &str| {
        Json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    };

    match state.behavior {
        MockBehavior::Reply(content) => (StatusCode::OK, reply(&content)),
        MockBehavior::Status(code) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(serde_json::json!({ "error": "mock failure" })),
        ),
        MockBehavior::Slow(delay, content) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, reply(&content))
        }
        MockBehavior::NoChoices => (StatusCode::OK, Json(serde_json::json!({ "choices": [] }))),
    }
}
