//! diced - chat dice bot daemon
//!
//! Detects dice notation like `[2d6+3]` in chat messages, rolls it, judges the
//! result under a horror ruleset and has Brown, the talk-show host, narrate it.

pub mod api;
pub mod bot;
pub mod config;
pub mod dice;
pub mod narrator;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use bot::Bot;
pub use config::Config;
use narrator::Narrator;

/// The diced server instance
pub struct Server {
    config: Config,
    bot: Arc<Bot>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Result<Self> {
        let narrator =
            Narrator::new(&config.narrator).context("failed to build narrator client")?;
        let bot = Bot::new(&config.bot, Arc::new(narrator));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            bot: Arc::new(bot),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get the bot handle
    pub fn bot(&self) -> Arc<Bot> {
        self.bot.clone()
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(self.bot.clone())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.bind_addr))?;
        let local_addr = listener.local_addr()?;
        info!("diced listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("diced shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
